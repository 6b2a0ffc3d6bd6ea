//! Tesseract OCR engine.
//!
//! Runs the `tesseract` binary in TSV mode so per-line confidences are
//! available for filtering.

use std::process::Command;

use image::DynamicImage;

use super::{ExtractionError, OcrAccuracy, OcrEngine, RecognizedLine, TextCandidate};

/// OCR engine backed by the system `tesseract` binary.
pub struct TesseractEngine {
    /// Languages passed to `-l`, e.g. `"kor+eng"`.
    languages: String,
    accuracy: OcrAccuracy,
}

impl TesseractEngine {
    /// Create an engine for the given language set.
    pub fn new(languages: &str) -> Self {
        Self {
            languages: languages.to_string(),
            accuracy: OcrAccuracy::default(),
        }
    }

    /// Set the recognition accuracy tier.
    pub fn with_accuracy(mut self, accuracy: OcrAccuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Run tesseract on an image file and return the raw TSV output.
    fn run_tesseract(&self, image_path: &std::path::Path) -> Result<String, ExtractionError> {
        let oem = match self.accuracy {
            OcrAccuracy::Fast => "0",
            OcrAccuracy::Accurate => "1",
        };

        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.languages, "--oem", oem, "tsv"])
            .output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(ExtractionError::ProcessingFailed(format!(
                        "tesseract failed: {}",
                        stderr
                    )))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ExtractionError::ProcessingFailed(
                    "tesseract not found (install tesseract-ocr)".to_string(),
                ))
            }
            Err(e) => Err(ExtractionError::ProcessingFailed(e.to_string())),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RecognizedLine>, ExtractionError> {
        // Tesseract works on files, so stage the decoded image as a PNG.
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| ExtractionError::ProcessingFailed(e.to_string()))?;
        let image_path = temp_dir.path().join("input.png");
        image
            .save_with_format(&image_path, image::ImageFormat::Png)
            .map_err(|e| ExtractionError::ProcessingFailed(e.to_string()))?;

        let tsv = self.run_tesseract(&image_path)?;
        Ok(parse_tsv_lines(&tsv))
    }
}

/// Group tesseract TSV word rows into recognized lines.
///
/// TSV columns are `level page block par line word left top width height conf
/// text`; word rows have level 5 and a non-negative confidence. Line
/// confidence is the mean word confidence scaled to `[0, 1]`.
fn parse_tsv_lines(tsv: &str) -> Vec<RecognizedLine> {
    let mut lines = Vec::new();
    let mut current_key: Option<(u32, u32, u32, u32)> = None;
    let mut words: Vec<(String, f32)> = Vec::new();

    let mut flush = |words: &mut Vec<(String, f32)>, lines: &mut Vec<RecognizedLine>| {
        if words.is_empty() {
            return;
        }
        let text = words
            .iter()
            .map(|(w, _)| w.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let confidence = words.iter().map(|(_, c)| c).sum::<f32>() / words.len() as f32 / 100.0;
        lines.push(RecognizedLine {
            candidates: vec![TextCandidate { text, confidence }],
        });
        words.clear();
    };

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let level: u32 = match cols[0].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        if level != 5 {
            continue;
        }
        let conf: f32 = cols[10].parse().unwrap_or(-1.0);
        let text = cols[11].trim();
        if conf < 0.0 || text.is_empty() {
            continue;
        }

        let key = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        if current_key != Some(key) {
            flush(&mut words, &mut lines);
            current_key = Some(key);
        }
        words.push((text.to_string(), conf));
    }
    flush(&mut words, &mut lines);

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word_row(block: u32, line: u32, word: u32, conf: f32, text: &str) -> String {
        format!("5\t1\t{block}\t1\t{line}\t{word}\t0\t0\t10\t10\t{conf}\t{text}")
    }

    #[test]
    fn test_parse_tsv_groups_words_into_lines() {
        let tsv = [
            HEADER.to_string(),
            "4\t1\t1\t1\t1\t0\t0\t0\t10\t10\t-1\t".to_string(),
            word_row(1, 1, 1, 96.0, "hello"),
            word_row(1, 1, 2, 88.0, "there"),
            word_row(1, 2, 1, 70.0, "bye"),
        ]
        .join("\n");

        let lines = parse_tsv_lines(&tsv);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].candidates[0].text, "hello there");
        assert!((lines[0].candidates[0].confidence - 0.92).abs() < 1e-6);
        assert_eq!(lines[1].candidates[0].text, "bye");
        assert!((lines[1].candidates[0].confidence - 0.70).abs() < 1e-6);
    }

    #[test]
    fn test_parse_tsv_skips_non_word_rows_and_negative_confidence() {
        let tsv = [
            HEADER.to_string(),
            word_row(1, 1, 1, -1.0, "ghost"),
            "not a tsv row".to_string(),
        ]
        .join("\n");
        assert!(parse_tsv_lines(&tsv).is_empty());
    }

    #[test]
    fn test_parse_tsv_preserves_top_to_bottom_order() {
        let tsv = [
            HEADER.to_string(),
            word_row(1, 1, 1, 90.0, "first"),
            word_row(2, 1, 1, 90.0, "second"),
            word_row(2, 2, 1, 90.0, "third"),
        ]
        .join("\n");
        let lines = parse_tsv_lines(&tsv);
        let texts: Vec<&str> = lines
            .iter()
            .map(|l| l.candidates[0].text.as_str())
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }
}
