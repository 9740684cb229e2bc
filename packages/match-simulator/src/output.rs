//! Output writers for simulation results.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;

use crate::simulator::GameResult;
use crate::summary::BatchSummary;
use crate::types::OutputFormat;

/// One CSV row per game.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    game_num: u32,
    session_id: &'a str,
    seed: u64,
    white: &'a str,
    black: &'a str,
    status: &'a str,
    winner: &'a str,
    plies: u32,
    truncated: bool,
    duration_ms: f64,
}

impl<'a> From<&'a GameResult> for CsvRow<'a> {
    fn from(r: &'a GameResult) -> Self {
        Self {
            game_num: r.game_num,
            session_id: &r.session_id,
            seed: r.seed,
            white: &r.white,
            black: &r.black,
            status: r.status.as_str(),
            winner: r.winner.map(|w| w.as_str()).unwrap_or(""),
            plies: r.plies,
            truncated: r.truncated,
            duration_ms: r.duration_ms,
        }
    }
}

pub struct OutputWriter {
    format: OutputFormat,
    dir: PathBuf,
    stem: String,
    jsonl_writer: Option<Box<dyn Write + Send>>,
    csv_writer: csv::Writer<BufWriter<File>>,
    buffered: Vec<GameResult>,
    results_path: PathBuf,
    csv_path: PathBuf,
    compress: bool,
}

impl OutputWriter {
    pub fn new(
        output_dir: &str,
        format: &OutputFormat,
        compress: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = Path::new(output_dir);
        std::fs::create_dir_all(dir)?;

        let timestamp = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Iso8601::DEFAULT)
            .unwrap_or_else(|_| "unknown".to_string())
            .replace(':', "-");
        let stem = format!("matches_{timestamp}");

        let (jsonl_writer, results_path) = match format {
            OutputFormat::Jsonl => {
                let (writer, path) = open(dir, &format!("{stem}.jsonl"), compress)?;
                (Some(writer), path)
            }
            OutputFormat::Json => (None, dir.join(format!("{stem}.json"))),
        };

        let csv_path = dir.join(format!("{stem}_summary.csv"));
        let csv_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&csv_path)?;
        let csv_writer = csv::Writer::from_writer(BufWriter::new(csv_file));

        Ok(Self {
            format: format.clone(),
            dir: dir.to_path_buf(),
            stem,
            jsonl_writer,
            csv_writer,
            buffered: Vec::new(),
            results_path,
            csv_path,
            compress,
        })
    }

    pub fn write_game(&mut self, result: &GameResult) -> Result<(), Box<dyn std::error::Error>> {
        match self.format {
            OutputFormat::Jsonl => {
                if let Some(writer) = self.jsonl_writer.as_mut() {
                    writeln!(writer, "{}", serde_json::to_string(result)?)?;
                    writer.flush()?;
                }
            }
            OutputFormat::Json => self.buffered.push(result.clone()),
        }
        self.csv_writer.serialize(CsvRow::from(result))?;
        self.csv_writer.flush()?;
        Ok(())
    }

    /// Flush everything and write the batch summary next to the results.
    pub fn finish(mut self, summary: &BatchSummary) -> Result<PathBuf, Box<dyn std::error::Error>> {
        if let Some(writer) = self.jsonl_writer.as_mut() {
            writer.flush()?;
        }
        if matches!(self.format, OutputFormat::Json) {
            let (mut writer, path) = open(&self.dir, &format!("{}.json", self.stem), self.compress)?;
            serde_json::to_writer_pretty(&mut writer, &self.buffered)?;
            writer.flush()?;
            self.results_path = path;
        }
        self.csv_writer.flush()?;

        let summary_path = self.dir.join(format!("{}_stats.json", self.stem));
        std::fs::write(&summary_path, serde_json::to_vec_pretty(summary)?)?;
        Ok(summary_path)
    }

    pub fn output_paths(&self) -> (&PathBuf, &PathBuf) {
        (&self.results_path, &self.csv_path)
    }
}

fn open(
    dir: &Path,
    filename: &str,
    compress: bool,
) -> Result<(Box<dyn Write + Send>, PathBuf), Box<dyn std::error::Error>> {
    if compress {
        let gz_path = dir.join(format!("{filename}.gz"));
        let writer: Box<dyn Write + Send> = Box::new(BufWriter::new(GzEncoder::new(
            File::create(&gz_path)?,
            Compression::default(),
        )));
        Ok((writer, gz_path))
    } else {
        let path = dir.join(filename);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok((Box::new(BufWriter::new(file)), path))
    }
}
