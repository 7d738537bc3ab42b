//! Device families and the (device, package) pairs each family ships in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PerfError, PerfResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Ice40,
    Xc7,
}

impl Family {
    pub fn parse(s: &str) -> PerfResult<Self> {
        match s {
            "ice40" => Ok(Family::Ice40),
            "xc7" => Ok(Family::Xc7),
            other => Err(PerfError::InvalidConfig(format!(
                "unknown device family '{other}' (expected ice40 or xc7)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Ice40 => "ice40",
            Family::Xc7 => "xc7",
        }
    }

    /// Devices of this family and the packages each one is sold in.
    pub fn devices(&self) -> &'static [(&'static str, &'static [&'static str])] {
        match self {
            Family::Ice40 => ICE40_DEVICES,
            Family::Xc7 => XC7_DEVICES,
        }
    }

    pub fn supports(&self, device: &str, package: &str) -> bool {
        self.devices()
            .iter()
            .any(|(d, pkgs)| *d == device && pkgs.contains(&package))
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ICE40_DEVICES: &[(&str, &[&str])] = &[
    ("hx1k", &["tq144", "vq100", "cb132"]),
    ("hx8k", &["ct256", "cb132", "bg121", "tq144"]),
    ("lp8k", &["cm81", "cm121", "cm225"]),
    ("up3k", &["uwg30"]),
    ("up5k", &["sg48", "uwg30"]),
];

const XC7_DEVICES: &[(&str, &[&str])] = &[
    ("a35t", &["csg324-1", "cpg236-1"]),
    ("a50t", &["csg324-1", "cpg236-1"]),
    ("a100t", &["csg324-1"]),
    ("a200t", &["sbg484-1"]),
];

/// A concrete part: family, device and package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub family: Family,
    pub device: String,
    pub package: String,
}

impl Target {
    pub fn new(family: Family, device: impl Into<String>, package: impl Into<String>) -> Self {
        Target {
            family,
            device: device.into(),
            package: package.into(),
        }
    }

    /// Vendor part name as used by Vivado, e.g. `xc7a35tcsg324-1`.
    pub fn xilinx_part(&self) -> String {
        format!("xc7{}{}", self.device, self.package)
    }

    /// Device identifier passed to the Lattice wrapper scripts, e.g. `hx8k-ct256`.
    pub fn lattice_dev(&self) -> String {
        format!("{}-{}", self.device, self.package)
    }

    /// Build an `UnsupportedTarget` error naming this target.
    pub fn unsupported(&self, toolchain: &str) -> PerfError {
        PerfError::UnsupportedTarget {
            toolchain: toolchain.to_string(),
            family: self.family.to_string(),
            device: self.device.clone(),
            package: self.package.clone(),
        }
    }

    /// Check this target against a family and an optional whitelist of (device, package) pairs.
    pub fn require(
        &self,
        toolchain: &str,
        family: Family,
        whitelist: Option<&[(&str, &str)]>,
    ) -> PerfResult<()> {
        if self.family != family || !family.supports(&self.device, &self.package) {
            return Err(self.unsupported(toolchain));
        }
        if let Some(allowed) = whitelist {
            if !allowed
                .iter()
                .any(|(d, p)| *d == self.device && *p == self.package)
            {
                return Err(self.unsupported(toolchain));
            }
        }
        Ok(())
    }
}
