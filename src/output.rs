use std::io::{self, Write};

use serde::Serialize;

use crate::batch::BatchOutcome;
use crate::domain::Record;
use crate::import::ImportReport;
use crate::page::Page;

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_page(result: &Page<Record>) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_batch(result: &BatchOutcome) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_import(result: &ImportReport) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl crate::app::ProgressSink for JsonOutput {
    fn event(&self, _event: crate::app::ProgressEvent) {}
}
