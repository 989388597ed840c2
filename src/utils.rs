//! # Utilities Module
//!
//! Common helpers used throughout the retrieval core: timing, text
//! truncation, and byte/duration formatting for logs and diagnostics.

use std::time::Instant;

/// Performance timer for measuring operation duration.
pub struct Timer {
    start: Instant,
    name: String,
}

/// Text processing utilities.
pub struct TextUtils;

/// System utilities.
pub struct SystemUtils;

impl Timer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn stop(self) -> u64 {
        let elapsed = self.elapsed_ms();
        tracing::debug!("Timer '{}' completed in {}ms", self.name, elapsed);
        elapsed
    }
}

impl TextUtils {
    pub fn truncate(text: &str, max_length: usize) -> String {
        if text.len() <= max_length {
            text.to_string()
        } else {
            format!("{}...", &text[..max_length.saturating_sub(3)])
        }
    }

    pub fn extract_preview(text: &str, max_words: usize) -> String {
        let words: Vec<&str> = text.split_whitespace().take(max_words).collect();
        let preview = words.join(" ");

        if words.len() >= max_words {
            format!("{preview}...")
        } else {
            preview
        }
    }

    pub fn sanitize(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || c.is_whitespace())
            .collect()
    }

    pub fn word_count(text: &str) -> usize {
        text.split_whitespace().count()
    }
}

impl SystemUtils {
    pub fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{hours}h {minutes}m {seconds}s")
        } else if minutes > 0 {
            format!("{minutes}m {seconds}s")
        } else {
            format!("{seconds}s")
        }
    }
}

/// Validation utilities for the Shell's argument-handling layer.
pub struct ValidationUtils;

impl ValidationUtils {
    pub fn is_valid_search_query(query: &str, min_length: usize, max_length: usize) -> bool {
        let trimmed = query.trim();
        !trimmed.is_empty() && trimmed.len() >= min_length && trimmed.len() <= max_length
    }

    pub fn sanitize_filename(filename: &str) -> String {
        filename
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[macro_export]
macro_rules! time_block {
    ($name:expr, $block:block) => {{
        let timer = $crate::utils::Timer::new($name);
        let result = $block;
        timer.stop();
        result
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_truncate() {
        assert_eq!(TextUtils::truncate("Hello world", 20), "Hello world");
        assert_eq!(TextUtils::truncate("This is a very long text", 10), "This is...");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(SystemUtils::format_bytes(512), "512 B");
        assert_eq!(SystemUtils::format_bytes(1024), "1.00 KB");
        assert_eq!(SystemUtils::format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn test_validation() {
        assert!(ValidationUtils::is_valid_search_query("test query", 2, 100));
        assert!(!ValidationUtils::is_valid_search_query("", 2, 100));
        assert!(!ValidationUtils::is_valid_search_query("a", 2, 100));
    }
}
