use std::path::{Path, PathBuf};

use crate::{cache::FileCache, error::CollocError};
use chrono::{naive::NaiveDateTime, Datelike, Duration};

/// A file in a remote archive along with its nominal start time.
///
/// Ordering is chronological, with the filename breaking ties.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchiveFile {
    start: NaiveDateTime,
    name: String,
}

impl ArchiveFile {
    pub fn new<S: Into<String>>(name: S, start: NaiveDateTime) -> Self {
        ArchiveFile {
            start,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// The calendar day this file belongs to, as `(year, day of year)`.
    pub fn day(&self) -> (i32, u32) {
        day_of(self.start)
    }
}

/// The `(year, day of year)` pair of an instant.
pub fn day_of(t: NaiveDateTime) -> (i32, u32) {
    (t.year(), t.ordinal())
}

/// A catalog of files in a remote archive.
///
/// Implementors supply the per-day listing, the filename to start time mapping and the transport.
/// Everything needed to resolve a time or a time range into files is built on top of those.
pub trait DataProduct {
    /// All files available for the given year and day of year, sorted ascending by name.
    fn list_day(&self, year: i32, day: u32) -> Result<Vec<String>, CollocError>;

    /// The nominal start time encoded in a filename.
    fn start_time(&self, filename: &str) -> Result<NaiveDateTime, CollocError>;

    /// Download a file so that it is fully present at `destination`.
    fn fetch(&self, filename: &str, destination: &Path) -> Result<(), CollocError>;

    /// The files of a day in chronological order.
    ///
    /// The order is re-derived from the parsed start times, listing order is never trusted.
    fn day_files(&self, year: i32, day: u32) -> Result<Vec<ArchiveFile>, CollocError> {
        let mut files = self
            .list_day(year, day)?
            .into_iter()
            .map(|name| {
                let start = self.start_time(&name)?;
                Ok(ArchiveFile::new(name, start))
            })
            .collect::<Result<Vec<_>, CollocError>>()?;

        files.sort();
        Ok(files)
    }

    /// The file with the latest start time strictly before `t`.
    ///
    /// Looks at the day of `t` and the last file of the day before. If none of those start before
    /// `t`, the latest of them is returned instead.
    fn file_before(&self, t: NaiveDateTime) -> Result<ArchiveFile, CollocError> {
        let (year, day) = day_of(t - Duration::days(1));
        let mut candidates: Vec<ArchiveFile> =
            self.day_files(year, day)?.into_iter().rev().take(1).collect();

        let (year, day) = day_of(t);
        candidates.extend(self.day_files(year, day)?);

        let before = candidates
            .iter()
            .filter(|f| f.start() < t)
            .min_by_key(|f| t - f.start());

        match before {
            Some(f) => Ok(f.clone()),
            None => {
                let latest = candidates.into_iter().max().ok_or_else(|| {
                    CollocError::NotFound(format!("no files around {}", t))
                })?;
                log::warn!(
                    "No file starts before {}, falling back to {}",
                    t,
                    latest.name()
                );
                Ok(latest)
            }
        }
    }

    /// The file right before `file`, looking one day back if `file` is the first of its day.
    fn preceding(&self, file: &ArchiveFile) -> Result<ArchiveFile, CollocError> {
        let (year, day) = file.day();
        let files = self.day_files(year, day)?;
        let i = position(&files, file)?;

        if i > 0 {
            return Ok(files[i - 1].clone());
        }

        let (year, day) = day_of(file.start() - Duration::days(1));
        self.day_files(year, day)?.pop().ok_or_else(|| {
            CollocError::NotFound(format!("no files on {}/{:03}", year, day))
        })
    }

    /// The file right after `file`, looking one day ahead if `file` is the last of its day.
    fn following(&self, file: &ArchiveFile) -> Result<ArchiveFile, CollocError> {
        let (year, day) = file.day();
        let files = self.day_files(year, day)?;
        let i = position(&files, file)?;

        if let Some(next) = files.get(i + 1) {
            return Ok(next.clone());
        }

        let (year, day) = day_of(file.start() + Duration::days(1));
        self.day_files(year, day)?
            .into_iter()
            .next()
            .ok_or_else(|| CollocError::NotFound(format!("no files on {}/{:03}", year, day)))
    }

    /// The files needed to cover the time range from `t0` to `t1`.
    ///
    /// Selects every file starting in the closed interval `[t0, t1]`. If there is none, the file
    /// starting closest to `t0` is used instead, so the result is never empty. Unless the last
    /// file already starts after `t1`, its successor is appended so the range is bracketed from
    /// above. `inclusive_start` prepends the predecessor of the first file and `inclusive_end`
    /// appends one more successor.
    fn files_covering(
        &self,
        t0: NaiveDateTime,
        t1: NaiveDateTime,
        inclusive_start: bool,
        inclusive_end: bool,
    ) -> Result<Vec<ArchiveFile>, CollocError> {
        if t0 >= t1 {
            return Err(CollocError::Range(format!(
                "start {} is not before end {}",
                t0, t1
            )));
        }

        let last_day = t1.date();
        let mut files = vec![];
        for date in t0.date().iter_days().take_while(|d| *d <= last_day) {
            let (year, day) = (date.year(), date.ordinal());
            files.extend(
                self.day_files(year, day)?
                    .into_iter()
                    .filter(|f| f.start() >= t0 && f.start() <= t1),
            );
        }

        if files.is_empty() {
            let mut candidates = vec![];
            for t in [t0, t0 + Duration::days(1)] {
                let (year, day) = day_of(t);
                candidates.extend(self.day_files(year, day)?);
            }

            let closest = candidates
                .into_iter()
                .min_by_key(|f| (f.start() - t0).num_milliseconds().abs())
                .ok_or_else(|| CollocError::NotFound(format!("no files around {}", t0)))?;
            log::debug!(
                "No file starts between {} and {}, using closest {}",
                t0,
                t1,
                closest.name()
            );
            files.push(closest);
        }

        if inclusive_start {
            let first = self.preceding(&files[0])?;
            files.insert(0, first);
        }

        if let Some(last) = files.last() {
            if last.start() <= t1 {
                let next = self.following(last)?;
                files.push(next);
            }
        }

        if inclusive_end {
            if let Some(last) = files.last() {
                let next = self.following(last)?;
                files.push(next);
            }
        }

        Ok(files)
    }

    /// Download a file through `cache`, returning its local path.
    fn download(&self, cache: &FileCache, file: &ArchiveFile) -> Result<PathBuf, CollocError> {
        cache.download_via(file.name(), |dest| {
            log::info!("Downloading {} to {:?}", file.name(), dest);
            self.fetch(file.name(), dest)
        })
    }
}

fn position(files: &[ArchiveFile], file: &ArchiveFile) -> Result<usize, CollocError> {
    files
        .iter()
        .position(|f| f.name() == file.name())
        .ok_or_else(|| {
            CollocError::NotFound(format!("{} is not in its day listing", file.name()))
        })
}
