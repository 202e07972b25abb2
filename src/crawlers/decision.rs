use crate::errors::CrawlError;
use crate::results::{NumberedItem, PaginationState};
use async_trait::async_trait;
use regex::Regex;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::sync::LazyLock;
use tokio::sync::mpsc;

static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(\d+)$").expect("range pattern should be valid"));

/// What to do after a round has been merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Reveal more items and run another round
    Continue,
    /// Inspect the item at this 1-based position
    InspectOne(usize),
    /// Inspect every position in the inclusive range
    InspectRange(usize, usize),
    Stop,
}

/// Parses one line of operator input.
///
/// A bare number inspects one item, `a-b` inspects a range, `y` loads more
/// (only while more is available) and anything else stops.
pub fn parse_decision(line: &str, pagination: PaginationState) -> Decision {
    let input = line.trim().to_lowercase();

    if input == "y" {
        return match pagination {
            PaginationState::MoreAvailable => Decision::Continue,
            PaginationState::Exhausted => Decision::Stop,
        };
    }

    if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
        return input.parse().map(Decision::InspectOne).unwrap_or(Decision::Stop);
    }

    if let Some(caps) = RANGE.captures(&input) {
        if let (Ok(start), Ok(end)) = (caps[1].parse(), caps[2].parse()) {
            return Decision::InspectRange(start, end);
        }
    }

    Decision::Stop
}

/// What the operator sees before deciding
#[derive(Debug, Clone, Copy)]
pub struct RoundSummary<'a> {
    /// 1-based round counter
    pub round: usize,
    pub new_items: &'a [NumberedItem],
    /// Number of tiles currently on the page
    pub visible: usize,
    pub pagination: PaginationState,
}

/// The operator boundary of the crawl loop
#[async_trait]
pub trait DecisionSource: Send {
    async fn decide(&mut self, round: &RoundSummary<'_>) -> Result<Decision, CrawlError>;
}

/// Prints a round the way the interactive prompt shows it
pub fn present_round(round: &RoundSummary<'_>) {
    if round.new_items.is_empty() {
        println!("No new items found.");
    }
    for item in round.new_items {
        println!("{}", item);
    }
}

fn prompt_for(pagination: PaginationState) -> &'static str {
    match pagination {
        PaginationState::MoreAvailable => {
            "Load more results? (y/n), or enter an item number or range (e.g. 3 or 2-5) to inspect: "
        }
        PaginationState::Exhausted => {
            "Enter an item number or range (e.g. 3 or 2-5) to inspect, or press Enter to exit: "
        }
    }
}

/// Interactive decisions read from standard input.
///
/// Lines are read on a dedicated thread and handed over a channel, so a
/// pending read never holds up runtime shutdown after an interrupt.
pub struct StdinDecisions {
    lines: mpsc::UnboundedReceiver<String>,
}

impl Default for StdinDecisions {
    fn default() -> Self {
        Self::new()
    }
}

impl StdinDecisions {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(std::io::stdin()))
    }

    /// Reads answers from any line source instead of the terminal
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        ::log::warn!("Failed to read from stdin: {}", e);
                        break;
                    }
                }
            }
        });
        Self { lines: rx }
    }

    /// Prints `prompt` and reads one line; `None` at end of input
    pub async fn ask(&mut self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        if let Err(e) = std::io::stdout().flush() {
            ::log::debug!("Could not flush prompt: {}", e);
        }
        self.lines.recv().await
    }
}

#[async_trait]
impl DecisionSource for StdinDecisions {
    async fn decide(&mut self, round: &RoundSummary<'_>) -> Result<Decision, CrawlError> {
        present_round(round);
        let line = self.ask(prompt_for(round.pagination)).await.unwrap_or_default();
        Ok(parse_decision(&line, round.pagination))
    }
}

/// A fixed sequence of answers; stops once they run out
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisions {
    answers: VecDeque<String>,
    echo: bool,
    rounds_seen: Vec<usize>,
}

impl ScriptedDecisions {
    pub fn new<I, T>(answers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            echo: false,
            rounds_seen: Vec::new(),
        }
    }

    /// Answers separated by commas, e.g. `"y,y,2-5"`
    pub fn from_script(script: &str) -> Self {
        Self::new(script.split(',').map(str::trim))
    }

    /// Print each round as the interactive prompt would
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Number of new items offered at each decision so far
    pub fn rounds_seen(&self) -> &[usize] {
        &self.rounds_seen
    }
}

#[async_trait]
impl DecisionSource for ScriptedDecisions {
    async fn decide(&mut self, round: &RoundSummary<'_>) -> Result<Decision, CrawlError> {
        self.rounds_seen.push(round.new_items.len());
        if self.echo {
            present_round(round);
        }
        let line = self.answers.pop_front().unwrap_or_default();
        if self.echo {
            println!("{}{}", prompt_for(round.pagination), line);
        }
        Ok(parse_decision(&line, round.pagination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MORE: PaginationState = PaginationState::MoreAvailable;
    const DONE: PaginationState = PaginationState::Exhausted;

    #[test]
    fn test_single_index() {
        assert_eq!(parse_decision("3", MORE), Decision::InspectOne(3));
        assert_eq!(parse_decision(" 12 \n", DONE), Decision::InspectOne(12));
        assert_eq!(parse_decision("0", DONE), Decision::InspectOne(0));
    }

    #[test]
    fn test_range() {
        assert_eq!(parse_decision("2-5", MORE), Decision::InspectRange(2, 5));
        assert_eq!(parse_decision("5-2", DONE), Decision::InspectRange(5, 2));
        assert_eq!(parse_decision("2 - 5", DONE), Decision::Stop);
        assert_eq!(parse_decision("2-", DONE), Decision::Stop);
        assert_eq!(parse_decision("-3", DONE), Decision::Stop);
    }

    #[test]
    fn test_continue_only_when_more_available() {
        assert_eq!(parse_decision("y", MORE), Decision::Continue);
        assert_eq!(parse_decision("Y", MORE), Decision::Continue);
        assert_eq!(parse_decision("y", DONE), Decision::Stop);
    }

    #[test]
    fn test_everything_else_stops() {
        for input in ["", "n", "yes", "+3", "3.5", "abc", "99999999999999999999999"] {
            assert_eq!(parse_decision(input, MORE), Decision::Stop, "input {:?}", input);
        }
    }

    #[tokio::test]
    async fn test_scripted_answers_then_stop() {
        let mut decisions = ScriptedDecisions::from_script("y, 2-3");
        let round = RoundSummary {
            round: 1,
            new_items: &[],
            visible: 0,
            pagination: MORE,
        };

        assert_eq!(decisions.decide(&round).await.unwrap(), Decision::Continue);
        assert_eq!(decisions.decide(&round).await.unwrap(), Decision::InspectRange(2, 3));
        assert_eq!(decisions.decide(&round).await.unwrap(), Decision::Stop);
        assert_eq!(decisions.rounds_seen(), &[0, 0, 0]);
    }

    #[tokio::test]
    async fn test_reader_answers_then_stop_at_end_of_input() {
        let input = std::io::Cursor::new("https://www.carnival.com/\n 2-4 \n");
        let mut decisions = StdinDecisions::from_reader(input);
        let round = RoundSummary {
            round: 1,
            new_items: &[],
            visible: 4,
            pagination: DONE,
        };

        assert_eq!(
            decisions.ask("URL: ").await.as_deref(),
            Some("https://www.carnival.com/")
        );
        assert_eq!(decisions.decide(&round).await.unwrap(), Decision::InspectRange(2, 4));
        assert_eq!(decisions.decide(&round).await.unwrap(), Decision::Stop);
    }
}
