use console::style;

use crate::ai::UsageSummary;
use crate::pipeline::{ChatAnswer, ChatOutcome};
use crate::search::CacheStats;

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    pub fn step(&self, message: &str) {
        println!("{}", style(message).dim());
    }

    /// Render one chat outcome
    pub fn outcome(&self, outcome: &ChatOutcome) {
        match outcome {
            ChatOutcome::EmptyQuestion => self.warning("Please enter a question."),
            ChatOutcome::RateLimited => {
                self.warning("Rate limit exceeded. Please wait before asking more questions.")
            }
            ChatOutcome::EmbeddingFailed => {
                self.error("Could not generate an embedding for your question.")
            }
            ChatOutcome::SearchFailed(message) => {
                self.error(&format!("Error searching logs: {}", message))
            }
            ChatOutcome::NoRelevantLogs => {
                self.warning("No relevant logs found for your question.")
            }
            ChatOutcome::SynthesisFailed(message) => {
                self.error(&format!("Error getting LLM response: {}", message))
            }
            ChatOutcome::Answered { answer, cached } => self.answer(answer, *cached),
        }
    }

    fn answer(&self, answer: &ChatAnswer, cached: bool) {
        self.success("Answer:");
        println!("{}", answer.answer);
        if cached {
            self.info("Served from cache");
        }

        self.section(&format!("Retrieved logs ({})", answer.logs.len()));
        for (i, log) in answer.logs.iter().enumerate() {
            println!("{} {}", style(format!("{:>3}.", i + 1)).dim(), log);
        }
    }

    /// Session usage for `/stats`
    pub fn usage(&self, summary: &UsageSummary, cache: &CacheStats) {
        self.section("Usage");
        println!("{}", summary.display());
        println!(
            "Cache: {} hits / {} misses ({:.0}%)",
            cache.hits,
            cache.misses,
            cache.hit_rate() * 100.0
        );
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
