use std::{
    collections::BTreeSet,
    fs::File,
    path::Path,
    sync::OnceLock,
};

use crate::{
    catalog::DataProduct, config::Credentials, error::CollocError, listing::ListingCache,
    naming::Naming, product::GpmProduct,
};
use chrono::naive::NaiveDateTime;
use regex::Regex;
use reqwest::blocking::{Client, Response};

const GESDISC_URL: &str = "https://gpm1.gesdisc.eosdis.nasa.gov/data";

/// A GPM product on the NASA GES DISC HTTPS server.
///
/// Day listings are scraped from the server's directory index pages at
/// `<level>/<product>/<year>/<day of year>/`.
#[derive(Clone, Debug)]
pub struct GesdiscArchive {
    product: GpmProduct,
    client: Client,
    credentials: Option<Credentials>,
    listings: ListingCache,
}

impl GesdiscArchive {
    pub fn connect(
        product: GpmProduct,
        credentials: Option<Credentials>,
    ) -> Result<Self, CollocError> {
        let client = Client::builder().build()?;
        log::info!("Using GES DISC product: {:?}", product);

        Ok(GesdiscArchive {
            product,
            client,
            credentials,
            listings: ListingCache::new(),
        })
    }

    fn day_url(&self, year: i32, day: u32) -> String {
        let prod: &'static str = self.product.into();
        format!("{}/{}/{}/{:03}/", GESDISC_URL, prod, year, day)
    }

    fn get(&self, url: &str) -> Result<Response, CollocError> {
        let mut request = self.client.get(url);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.user, Some(&creds.password));
        }

        Ok(request.send()?.error_for_status()?)
    }
}

impl DataProduct for GesdiscArchive {
    fn list_day(&self, year: i32, day: u32) -> Result<Vec<String>, CollocError> {
        let url = self.day_url(year, day);

        self.listings.get_or_fetch(&url, || {
            log::debug!("Scraping GES DISC listing: {}", &url);
            let body = self.get(&url)?.text()?;
            Ok(scrape_listing(&body))
        })
    }

    fn start_time(&self, filename: &str) -> Result<NaiveDateTime, CollocError> {
        Naming::Gpm.start_time(filename)
    }

    fn fetch(&self, filename: &str, destination: &Path) -> Result<(), CollocError> {
        let (year, day) = crate::catalog::day_of(self.start_time(filename)?);
        let url = format!("{}{}", self.day_url(year, day), filename);

        let mut response = self.get(&url)?;
        let mut f = File::create(destination)?;
        let bytes = response.copy_to(&mut f)?;
        log::debug!("Received {} bytes from {}", bytes, url);

        Ok(())
    }
}

fn hdf5_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""([^"]*\.HDF5)""#).expect("valid link pattern"))
}

/// Pull the unique `.HDF5` filenames out of a directory index page, sorted by name.
fn scrape_listing(html: &str) -> Vec<String> {
    hdf5_link_pattern()
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| {
            let link = m.as_str();
            match link.rfind('/') {
                Some(i) => link[(i + 1)..].to_owned(),
                None => link.to_owned(),
            }
        })
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}
