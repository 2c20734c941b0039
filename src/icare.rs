use std::{fs, path::Path};

use crate::{
    catalog::DataProduct, config::Credentials, error::CollocError, listing::ListingCache,
    product::IcareProduct,
};
use chrono::{naive::NaiveDateTime, NaiveDate};
use suppaftp::FtpStream;

const ICARE_HOST: &str = "ftp.icare.univ-lille1.fr:21";

/// A product on the ICARE data center FTP server.
///
/// Files are stored under `<product>/<year>/<YYYY_MM_DD>/`. Every operation opens its own
/// connection; day listings are cached.
#[derive(Clone, Debug)]
pub struct IcareArchive {
    product: IcareProduct,
    credentials: Credentials,
    listings: ListingCache,
}

impl IcareArchive {
    pub fn connect(product: IcareProduct, credentials: Credentials) -> Self {
        log::info!("Using ICARE product: {:?}", product);
        IcareArchive {
            product,
            credentials,
            listings: ListingCache::new(),
        }
    }

    pub fn product(&self) -> IcareProduct {
        self.product
    }

    fn day_path(&self, date: NaiveDate) -> String {
        let prod: &'static str = self.product.into();
        format!("{}/{}/{}", prod, date.format("%Y"), date.format("%Y_%m_%d"))
    }

    fn open(&self, path: &str) -> Result<FtpStream, CollocError> {
        let mut ftp = FtpStream::connect(ICARE_HOST)?;
        ftp.login(&self.credentials.user, &self.credentials.password)?;
        ftp.cwd(path).map_err(|err| {
            CollocError::Transport(format!(
                "can't find product folder {} on the ICARE server: {}",
                path, err
            ))
        })?;

        Ok(ftp)
    }
}

impl DataProduct for IcareArchive {
    fn list_day(&self, year: i32, day: u32) -> Result<Vec<String>, CollocError> {
        let date = NaiveDate::from_yo_opt(year, day)
            .ok_or_else(|| CollocError::Range(format!("no day {} in {}", day, year)))?;
        let path = self.day_path(date);

        self.listings.get_or_fetch(&path, || {
            log::debug!("Listing ICARE directory: {}", &path);
            let mut ftp = self.open(&path)?;
            let names = ftp.nlst(None)?;
            if let Err(err) = ftp.quit() {
                log::warn!("Error closing FTP connection: {}", err);
            }

            Ok(hdf_files(names))
        })
    }

    fn start_time(&self, filename: &str) -> Result<NaiveDateTime, CollocError> {
        self.product.naming().start_time(filename)
    }

    fn fetch(&self, filename: &str, destination: &Path) -> Result<(), CollocError> {
        let path = self.day_path(self.start_time(filename)?.date());

        let mut ftp = self.open(&path)?;
        let data = ftp.retr_as_buffer(filename)?;
        if let Err(err) = ftp.quit() {
            log::warn!("Error closing FTP connection: {}", err);
        }

        fs::write(destination, data.into_inner())?;
        Ok(())
    }
}

/// Keep the HDF files of a raw directory listing, sorted by name.
fn hdf_files(names: Vec<String>) -> Vec<String> {
    let mut files: Vec<String> = names
        .into_iter()
        .map(|name| match name.rfind('/') {
            Some(i) => name[(i + 1)..].to_owned(),
            None => name,
        })
        .filter(|name| name.ends_with("hdf"))
        .collect();

    files.sort();
    files
}
