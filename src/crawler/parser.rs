//! HTML parser for extracting company profile fields
//!
//! Extraction is best-effort pattern matching over a profile page:
//! - FAQ blocks (`div.qanda-body`) carry revenue, employee count and address
//! - The first meaningful heading is the company name
//! - Email, phone and activity code are found by regex over the page text
//!
//! A field that cannot be found is left empty.

use crate::config::ExtractConfig;
use crate::output::{Field, Fields};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

const FAQ_SELECTOR: &str = "div.qanda-body";
const BOLD_SELECTOR: &str = "span.text-bold";
const HEADING_SELECTOR: &str = "h1, h2, h3";

/// Errors that can occur during extraction
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Document is empty")]
    EmptyDocument,

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// Turns raw page content into a record
pub trait Extractor: Send + Sync {
    fn extract(&self, content: &str) -> Result<Fields, ExtractionError>;
}

/// Extractor for company profile pages
#[derive(Debug, Clone)]
pub struct ProfileExtractor {
    localities: Vec<String>,
    email_exclusions: Vec<String>,
    email: Regex,
    phones: Vec<Regex>,
    activity_code: Regex,
    four_digits: Regex,
    number: Regex,
    integer: Regex,
}

impl ProfileExtractor {
    pub fn new(config: &ExtractConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            localities: config
                .localities
                .iter()
                .map(|l| l.trim().to_uppercase())
                .filter(|l| !l.is_empty())
                .collect(),
            email_exclusions: config
                .email_exclusions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            email: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")?,
            phones: vec![
                Regex::new(r"\+382[\s\-]?\d{2}[\s\-]?\d{3}[\s\-]?\d{3}")?,
                Regex::new(r"0\d{2}[\s\-]?\d{3}[\s\-]?\d{3}")?,
                Regex::new(r"\d{3}[\s\-]?\d{3}[\s\-]?\d{3}")?,
            ],
            activity_code: Regex::new(r"(?i)KD[:\s]*(\d{4})")?,
            four_digits: Regex::new(r"\b\d{4}\b")?,
            number: Regex::new(r"\d[\d.,]*")?,
            integer: Regex::new(r"\d+")?,
        })
    }

    /// Revenue, employee count and locality from the FAQ blocks
    fn extract_faq(&self, document: &Html, fields: &mut Fields) -> Result<(), ExtractionError> {
        let faq = selector(FAQ_SELECTOR)?;
        let bold = selector(BOLD_SELECTOR)?;

        for block in document.select(&faq) {
            let text = element_text(&block);
            let lower = text.to_lowercase();
            let emphasised = block.select(&bold).next().map(|span| element_text(&span));

            if lower.contains("prihod") && fields.revenue.is_empty() {
                if let Some(m) = emphasised.as_deref().and_then(|s| self.number.find(s)) {
                    fields.revenue = normalize_amount(m.as_str());
                }
            }

            if lower.contains("zaposlenih") && fields.employee_count.is_empty() {
                if let Some(m) = emphasised.as_deref().and_then(|s| self.integer.find(s)) {
                    if m.as_str().len() < 6 {
                        fields.employee_count = m.as_str().to_string();
                    }
                }
            }

            if lower.contains("adresa") && fields.locality.is_empty() {
                let upper = text.to_uppercase();
                if let Some(locality) = self.localities.iter().find(|l| upper.contains(l.as_str())) {
                    fields.locality = locality.clone();
                }
            }
        }

        Ok(())
    }

    fn extract_name(&self, document: &Html) -> Result<Option<String>, ExtractionError> {
        let headings = selector(HEADING_SELECTOR)?;
        Ok(document
            .select(&headings)
            .map(|h| element_text(&h).trim().to_string())
            .find(|text| text.chars().count() > 3 && !text.to_lowercase().contains("rezultati")))
    }

    fn extract_email(&self, text: &str) -> Option<String> {
        self.email
            .find_iter(text)
            .map(|m| m.as_str())
            .find(|email| {
                let lower = email.to_lowercase();
                !self
                    .email_exclusions
                    .iter()
                    .any(|skip| lower.contains(skip.as_str()))
            })
            .map(str::to_string)
    }

    fn extract_phone(&self, text: &str) -> Option<String> {
        self.phones
            .iter()
            .flat_map(|pattern| pattern.find_iter(text))
            .map(|m| m.as_str().trim())
            .find(|phone| {
                let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
                (8..=15).contains(&digits)
            })
            .map(str::to_string)
    }

    fn extract_activity_code(&self, text: &str) -> Option<String> {
        if let Some(code) = self
            .activity_code
            .captures(text)
            .and_then(|caps| caps.get(1))
        {
            return Some(code.as_str().to_string());
        }
        self.four_digits.find(text).map(|m| m.as_str().to_string())
    }
}

impl Extractor for ProfileExtractor {
    fn extract(&self, content: &str) -> Result<Fields, ExtractionError> {
        if content.trim().is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        let document = Html::parse_document(content);
        let text = element_text(&document.root_element());
        let mut fields = Fields::default();

        self.extract_faq(&document, &mut fields)?;

        if let Some(name) = self.extract_name(&document)? {
            fields.fill(Field::Name, name);
        }
        if let Some(email) = self.extract_email(&text) {
            fields.fill(Field::ContactEmail, email);
        }
        if let Some(phone) = self.extract_phone(&text) {
            fields.fill(Field::Phone, phone);
        }
        if let Some(code) = self.extract_activity_code(&text) {
            fields.fill(Field::ActivityCode, code);
        }

        tracing::debug!(
            "Extracted {} of {} fields",
            Field::ALL
                .iter()
                .filter(|f| !fields.get(**f).is_empty())
                .count(),
            Field::ALL.len()
        );
        Ok(fields)
    }
}

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector(format!("{}: {:?}", css, e)))
}

/// Text content of an element, text nodes separated by a space
fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

/// "1.234.567,89" -> "1234567.89"
fn normalize_amount(raw: &str) -> String {
    raw.replace('.', "").replace(',', ".")
}
