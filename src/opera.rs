use std::{fs::File, path::Path, sync::OnceLock, thread, time::Duration};

use crate::{
    catalog::DataProduct, config::Credentials, error::CollocError, naming::Naming,
    product::OperaProduct,
};
use chrono::{naive::NaiveDateTime, NaiveDate};
use regex::Regex;
use reqwest::blocking::Client;

const OPERA_URL: &str = "https://geoservices.meteofrance.fr/services";
const MINUTES_PER_DAY: u32 = 24 * 60;

/// OPERA radar composites from the Météo-France geoservices API.
///
/// The service has no directory listing. Composites exist at fixed intervals, so a day's files are
/// generated from the product id and the interval, and downloads are requested by time.
#[derive(Clone, Debug)]
pub struct OperaArchive {
    product: OperaProduct,
    token: String,
    client: Client,
    interval_minutes: u32,
    throttle: Duration,
}

impl OperaArchive {
    pub fn connect(product: OperaProduct, token: String) -> Result<Self, CollocError> {
        Ok(OperaArchive {
            product,
            token,
            client: Client::builder().build()?,
            interval_minutes: 15,
            throttle: Duration::from_secs(5),
        })
    }

    /// Exchange a user name and password for an API token.
    pub fn request_token(credentials: &Credentials) -> Result<String, CollocError> {
        let body = Client::builder()
            .build()?
            .get(format!("{}/GetAPIKey", OPERA_URL))
            .query(&[
                ("username", credentials.user.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()?
            .error_for_status()?
            .text()?;

        parse_token(&body)
    }

    /// Set the spacing of composites in minutes. It must divide a day evenly.
    pub fn with_interval(mut self, minutes: u32) -> Result<Self, CollocError> {
        if minutes == 0 || MINUTES_PER_DAY % minutes != 0 {
            return Err(CollocError::Range(format!(
                "interval of {} minutes does not divide a day",
                minutes
            )));
        }

        self.interval_minutes = minutes;
        Ok(self)
    }

    /// Pause after every download, the service rejects rapid requests.
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    fn filename(&self, t: NaiveDateTime) -> String {
        let prod: &'static str = self.product.into();
        format!("OPERA_{}_{}.hdf", prod, t.format("%Y_%j_%H_%M"))
    }
}

impl DataProduct for OperaArchive {
    fn list_day(&self, year: i32, day: u32) -> Result<Vec<String>, CollocError> {
        let date = NaiveDate::from_yo_opt(year, day)
            .ok_or_else(|| CollocError::Range(format!("no day {} in {}", day, year)))?;

        (0..MINUTES_PER_DAY)
            .step_by(self.interval_minutes as usize)
            .map(|minute| {
                date.and_hms_opt(minute / 60, minute % 60, 0)
                    .map(|t| self.filename(t))
                    .ok_or_else(|| CollocError::range("minute out of range"))
            })
            .collect()
    }

    fn start_time(&self, filename: &str) -> Result<NaiveDateTime, CollocError> {
        Naming::Opera.start_time(filename)
    }

    fn fetch(&self, filename: &str, destination: &Path) -> Result<(), CollocError> {
        let t = self.start_time(filename)?;
        let prod: &'static str = self.product.into();
        let time = t.format("%Y-%m-%dT%H:%M:%SZ").to_string();

        let mut response = self
            .client
            .get(format!("{}/odyssey", OPERA_URL))
            .query(&[
                ("product", prod),
                ("time", time.as_str()),
                ("token", self.token.as_str()),
                ("format", "HDF5"),
            ])
            .send()?
            .error_for_status()?;

        let mut f = File::create(destination)?;
        response.copy_to(&mut f)?;

        thread::sleep(self.throttle);
        Ok(())
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]+>\s*([^<\s]+)\s*</").expect("valid token pattern"))
}

/// The text content of the single element in a `GetAPIKey` response.
fn parse_token(body: &str) -> Result<String, CollocError> {
    token_pattern()
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
        .ok_or_else(|| CollocError::Transport(format!("no token in response: {}", body)))
}
