//! Output formatting for assessment results.

use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;

use crate::advice::{indicators, recommendations};
use crate::model::MODEL_DESCRIPTION;
use crate::risk::{RiskAssessment, RiskLevel};

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RiskAssessment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub indicators: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn assessed(path: PathBuf, file_name: String, size_bytes: u64, assessment: RiskAssessment) -> Self {
        Self {
            path,
            file_name,
            size_bytes,
            indicators: indicators(&assessment.features),
            recommendations: recommendations(assessment.level).to_vec(),
            assessment: Some(assessment),
            error: None,
        }
    }

    pub fn failed(path: PathBuf, file_name: String, size_bytes: u64, error: String) -> Self {
        Self {
            path,
            file_name,
            size_bytes,
            assessment: None,
            indicators: Vec::new(),
            recommendations: Vec::new(),
            error: Some(error),
        }
    }

    pub fn level(&self) -> Option<RiskLevel> {
        self.assessment.map(|a| a.level)
    }

    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {s}. Use 'text' or 'json'.")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub errors: usize,
}

impl Summary {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut summary = Summary {
            total: reports.len(),
            ..Summary::default()
        };
        for r in reports {
            match r.level() {
                Some(RiskLevel::Low) => summary.low += 1,
                Some(RiskLevel::Medium) => summary.medium += 1,
                Some(RiskLevel::High) => summary.high += 1,
                None => summary.errors += 1,
            }
        }
        summary
    }
}

pub fn print_results(reports: &[FileReport], format: OutputFormat, details: bool) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = match format {
        OutputFormat::Text => write_text(&mut out, reports, details),
        OutputFormat::Json => write_json(&mut out, reports),
    };
    if let Err(e) = written {
        tracing::error!("failed to write results: {e}");
    }
}

pub fn write_text<W: Write>(out: &mut W, reports: &[FileReport], details: bool) -> io::Result<()> {
    let rule = "=".repeat(70);

    for r in reports {
        writeln!(out, "\n{rule}")?;
        writeln!(out, "FILE: {}", r.file_name)?;
        writeln!(out, "{rule}")?;
        writeln!(out, "  Path:       {}", r.path.display())?;
        writeln!(out, "  Size:       {:.2} KB", r.size_kb())?;

        let Some(a) = &r.assessment else {
            let err = r.error.as_deref().unwrap_or("unknown");
            writeln!(out, "  [ERR ] {err}")?;
            continue;
        };

        writeln!(out, "  Risk Level: {}", a.level)?;
        writeln!(out, "  Risk Score: {}%", a.percentage())?;

        writeln!(out, "\n  DETECTED INDICATORS:")?;
        if r.indicators.is_empty() {
            writeln!(out, "    (none)")?;
        }
        for ind in &r.indicators {
            writeln!(out, "    • {ind}")?;
        }

        writeln!(out, "\n  RECOMMENDED ACTIONS:")?;
        for rec in &r.recommendations {
            writeln!(out, "    • {rec}")?;
        }

        if details {
            writeln!(out, "\n  TECHNICAL DETAILS:")?;
            for (name, value) in a.features.named() {
                writeln!(out, "    {name:<26} {value:.4}")?;
            }
            writeln!(out, "    {:<26} {MODEL_DESCRIPTION}", "Model")?;
        }
    }

    let s = Summary::from_reports(reports);
    writeln!(out, "\n{rule}")?;
    writeln!(out, "SUMMARY:")?;
    writeln!(out, "  Total files assessed: {}", s.total)?;
    writeln!(out, "  High risk:            {}", s.high)?;
    writeln!(out, "  Medium risk:          {}", s.medium)?;
    writeln!(out, "  Low risk:             {}", s.low)?;
    writeln!(out, "  Errors:               {}", s.errors)?;
    writeln!(out, "{rule}")?;
    Ok(())
}

pub fn write_json<W: Write>(out: &mut W, reports: &[FileReport]) -> io::Result<()> {
    let output = serde_json::json!({
        "results": reports,
        "summary": Summary::from_reports(reports),
    });
    serde_json::to_writer_pretty(&mut *out, &output)?;
    writeln!(out)
}
