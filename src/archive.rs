use std::{path::PathBuf, sync::Arc};

use crate::{
    cache::FileCache,
    catalog::{ArchiveFile, DataProduct},
    error::CollocError,
};
use chrono::naive::NaiveDateTime;
use crossbeam_channel::{bounded, Receiver, Sender};

/// A remote data product paired with the local cache its files are downloaded into.
pub struct Archive<P: DataProduct> {
    cache: Arc<FileCache>,
    product: P,
}

impl<P: 'static> Archive<P>
where
    P: DataProduct + Clone + Send,
{
    pub fn connect(cache: Arc<FileCache>, product: P) -> Self {
        log::info!("Connected to archive cached at: {:?}", cache.root());
        Self { cache, product }
    }

    pub fn product(&self) -> &P {
        &self.product
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    /// Local paths of the files covering `start` to `end`, downloading those not cached yet.
    ///
    /// Paths are returned in chronological order.
    pub fn retrieve_paths(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<PathBuf>, CollocError> {
        Self::validate_dates(start, end)?;

        let files = self.product.files_covering(start, end, false, false)?;
        log::info!("{} files cover {} to {}", files.len(), start, end);

        self.download_all(files)
    }

    /// Local path of the latest file starting before `t`.
    pub fn retrieve_before(&self, t: NaiveDateTime) -> Result<PathBuf, CollocError> {
        let file = self.product.file_before(t)?;
        self.product.download(&self.cache, &file)
    }
}

// Private methods and associated functions.

const NUM_DOWNLOADERS: usize = 3;

type Downloaded = (usize, Result<PathBuf, CollocError>);

impl<P: 'static> Archive<P>
where
    P: DataProduct + Clone + Send,
{
    fn download_all(&self, files: Vec<ArchiveFile>) -> Result<Vec<PathBuf>, CollocError> {
        let num_files = files.len();

        // Sized so queueing every file up front never blocks.
        let (to_downloader, needs_downloaded) = bounded(num_files.max(1));
        let (to_accumulator, downloaded) = bounded(10);

        self.start_download_threads(needs_downloaded, to_accumulator);

        for job in files.into_iter().enumerate() {
            to_downloader
                .send(job)
                .map_err(|_| CollocError::transport("download threads stopped early"))?;
        }
        drop(to_downloader);

        Self::accumulate(downloaded, num_files)
    }

    fn start_download_threads(
        &self,
        files: Receiver<(usize, ArchiveFile)>,
        to_accumulator: Sender<Downloaded>,
    ) {
        let pool = threadpool::ThreadPool::with_name("Download Thread".to_owned(), NUM_DOWNLOADERS);

        for _ in 0..NUM_DOWNLOADERS {
            let product = self.product.clone();
            let cache = Arc::clone(&self.cache);
            let files = files.clone();
            let to_accumulator = to_accumulator.clone();

            pool.execute(move || {
                for (i, file) in files {
                    let result = product.download(&cache, &file);
                    if let Err(err) = &result {
                        log::error!("Error downloading {} : {}", file.name(), err);
                    }

                    if to_accumulator.send((i, result)).is_err() {
                        break;
                    }
                }
            });
        }
    }

    fn accumulate(
        downloaded: Receiver<Downloaded>,
        num_files: usize,
    ) -> Result<Vec<PathBuf>, CollocError> {
        let mut paths: Vec<Option<PathBuf>> = vec![None; num_files];

        for (i, result) in downloaded {
            paths[i] = Some(result?);
        }

        paths
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| CollocError::transport("download threads stopped early"))
    }

    fn validate_dates(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), CollocError> {
        log::info!("start - {} end {}", start, end);

        if end <= start {
            log::error!("End not after start: start - {} end - {}", start, end);
            return Err(CollocError::Range(format!(
                "start {} is not before end {}",
                start, end
            )));
        }

        Ok(())
    }
}
