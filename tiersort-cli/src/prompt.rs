/// Asking the human which of two items wins.
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    First,
    Second,
    /// Stop for now; progress is already saved.
    Quit,
}

/// Show one pair and read a verdict: `1`, `2`, or `q`. Re-asks on anything
/// else. End of input counts as quitting.
pub fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    header: &str,
    first: &str,
    second: &str,
) -> io::Result<Answer> {
    writeln!(output, "\n{header}")?;
    writeln!(output, "  1) {first}")?;
    writeln!(output, "  2) {second}")?;

    let mut line = String::new();
    loop {
        write!(output, "Which is better? [1/2, q to stop] ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(Answer::Quit);
        }
        match line.trim() {
            "1" => return Ok(Answer::First),
            "2" => return Ok(Answer::Second),
            "q" | "Q" | "quit" => return Ok(Answer::Quit),
            _ => writeln!(output, "Please type 1, 2 or q.")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(input: &str) -> (Answer, String) {
        let mut output = Vec::new();
        let answer = ask(&mut Cursor::new(input), &mut output, "[3/9]", "Pizza", "Sushi").unwrap();
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_shows_both_options() {
        let (answer, shown) = run("2\n");
        assert_eq!(answer, Answer::Second);
        assert!(shown.contains("[3/9]"));
        assert!(shown.contains("1) Pizza"));
        assert!(shown.contains("2) Sushi"));
    }

    #[test]
    fn test_reasks_until_valid() {
        let (answer, shown) = run("maybe\n\n 1 \n");
        assert_eq!(answer, Answer::First);
        assert_eq!(shown.matches("Please type 1, 2 or q.").count(), 2);
    }

    #[test]
    fn test_quit_and_eof() {
        assert_eq!(run("q\n").0, Answer::Quit);
        assert_eq!(run("").0, Answer::Quit);
    }
}
