/**************************************************************************************************
 *                                           Public API
 *************************************************************************************************/
pub use crate::{
    archive::Archive,
    cache::FileCache,
    catalog::{day_of, ArchiveFile, DataProduct},
    collocation::{great_circle_km, Collocation, CollocationIndex, GeoGrid},
    config::Credentials,
    error::CollocError,
    gesdisc::GesdiscArchive,
    icare::IcareArchive,
    listing::ListingCache,
    naming::Naming,
    opera::OperaArchive,
    product::{GpmProduct, IcareProduct, OperaProduct},
};
/**************************************************************************************************
 *                                      Private Implementation
 *************************************************************************************************/
mod archive;
mod cache;
mod catalog;
mod collocation;
mod config;
mod error;
mod gesdisc;
mod icare;
mod listing;
mod naming;
mod opera;
mod product;
