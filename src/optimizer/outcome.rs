use crate::domain::{Domain, Point};
use crate::history::{History, Observation};

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    /// The full evaluation budget was spent.
    Completed,
    /// The objective's `before_evaluation` hook stopped the run.
    Interrupted,
}

/// The result of a finished run: every observation plus the best one.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome {
    /// All observations in evaluation order.
    pub history: History,
    /// Why the run stopped.
    pub termination: Termination,
}

impl Outcome {
    pub(crate) fn new(history: History, termination: Termination) -> Self {
        Self {
            history,
            termination,
        }
    }

    /// Returns the best observation, or `None` if nothing was evaluated.
    #[must_use]
    pub fn best(&self) -> Option<&Observation> {
        self.history.best()
    }

    /// Returns the best point found.
    #[must_use]
    pub fn best_point(&self) -> Option<&Point> {
        self.best().map(|o| &o.point)
    }

    /// Returns the best score found.
    #[must_use]
    pub fn best_score(&self) -> Option<f64> {
        self.best().map(|o| o.score)
    }

    /// Returns the running best score after each evaluation.
    #[must_use]
    pub fn trajectory(&self) -> Vec<f64> {
        self.history.best_trajectory()
    }

    /// Writes the history as CSV.
    ///
    /// Columns: `evaluation` (one-based), `score`, `best_score` (running
    /// best), then one column per dimension of `domain`, in domain order.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use smbo::prelude::*;
    ///
    /// let domain = Domain::new(vec![Dimension::discrete("depth", 1, 8)]).unwrap();
    /// let outcome = RandomSearch::new(4)
    ///     .seed(0)
    ///     .run(&domain, |p: &Point| Ok::<_, Error>(p[0]))
    ///     .unwrap();
    ///
    /// let mut buf = Vec::new();
    /// outcome.to_csv(&domain, &mut buf).unwrap();
    /// let csv = String::from_utf8(buf).unwrap();
    /// assert!(csv.starts_with("evaluation,score,best_score,depth\n"));
    /// assert_eq!(csv.lines().count(), 5);
    /// ```
    pub fn to_csv(&self, domain: &Domain, mut writer: impl std::io::Write) -> std::io::Result<()> {
        let mut header = vec!["evaluation", "score", "best_score"];
        header.extend(domain.dimensions().iter().map(|d| d.name()));
        let header: Vec<String> = header.into_iter().map(csv_escape).collect();
        writeln!(writer, "{}", header.join(","))?;

        for (i, (obs, best)) in self
            .history
            .iter()
            .zip(self.history.best_trajectory())
            .enumerate()
        {
            write!(writer, "{},{},{}", i + 1, obs.score, best)?;
            for v in &obs.point {
                write!(writer, ",{v}")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Writes the history as CSV to a file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn export_csv(
        &self,
        domain: &Domain,
        path: impl AsRef<std::path::Path>,
    ) -> std::io::Result<()> {
        use std::io::Write;

        let mut writer = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.to_csv(domain, &mut writer)?;
        writer.flush()
    }
}

#[cfg(feature = "serde")]
impl Outcome {
    /// Saves the outcome as pretty-printed JSON.
    ///
    /// The file is written next to `path` first and then renamed, so a
    /// crash mid-write never leaves a truncated file behind.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        let parent = path.parent().unwrap_or(std::path::Path::new("."));
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        ));
        let file = std::fs::File::create(&tmp_path)?;
        serde_json::to_writer_pretty(file, self).map_err(std::io::Error::other)?;
        std::fs::rename(&tmp_path, path)
    }

    /// Loads an outcome saved with [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// Quote a CSV field if it contains a comma, quote or line break.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}
