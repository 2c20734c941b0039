use crate::naming::Naming;
use strum::{EnumString, IntoStaticStr};

/// Products served by the ICARE FTP server, serialized as their directory on the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IntoStaticStr, EnumString)]
pub enum IcareProduct {
    #[strum(serialize = "SPACEBORNE/CALIOP/01kmCLay.v4.10")]
    Caliop01kmCLay,
    #[strum(serialize = "SPACEBORNE/MULTI_SENSOR/DARDAR_CLOUD")]
    DardarCloud,
    #[strum(serialize = "SPACEBORNE/MODIS/MYD021KM")]
    ModisMyd021km,
    #[strum(serialize = "SPACEBORNE/MODIS/MYD03")]
    ModisMyd03,
    #[strum(serialize = "SPACEBORNE/MODIS/MOD021KM")]
    ModisMod021km,
    #[strum(serialize = "SPACEBORNE/MODIS/MOD03")]
    ModisMod03,
    #[strum(serialize = "SPACEBORNE/CLOUDSAT/2B-CLDCLASS.v05.06")]
    CloudsatCldclass,
}

impl IcareProduct {
    pub fn naming(&self) -> Naming {
        use IcareProduct::*;

        match *self {
            Caliop01kmCLay => Naming::Caliop,
            DardarCloud => Naming::Dardar,
            ModisMyd021km | ModisMyd03 | ModisMod021km | ModisMod03 => Naming::Modis,
            CloudsatCldclass => Naming::Cloudsat,
        }
    }
}

/// GPM products served by the NASA GES DISC, serialized as `<level>/<product>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IntoStaticStr, EnumString)]
pub enum GpmProduct {
    #[strum(serialize = "GPM_L2/GPM_2ADPR.06")]
    Dpr2a,
    #[strum(serialize = "GPM_L2/GPM_2BCMB.06")]
    Combined2b,
    #[strum(serialize = "GPM_L2/GPM_2AGPROFGPMGMI.05")]
    GprofGmi2a,
    #[strum(serialize = "GPM_L1C/GPM_1CGPMGMI_R.05")]
    GmiRadiances1c,
}

/// OPERA ground radar composites, serialized as the product id used in requests and filenames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IntoStaticStr, EnumString)]
pub enum OperaProduct {
    #[strum(serialize = "RAINFALL_RATE")]
    RainfallRate,
    #[strum(serialize = "MAXIMUM_REFLECTIVITY")]
    MaximumReflectivity,
    #[strum(serialize = "HOURLY_RAINFAL_ACCUMULATION")]
    HourlyAccumulation,
}
