//! Version strings from `--version` output and tool-written files.

use crate::{PerfError, PerfResult};

/// `Yosys 0.9+932 (git sha1 4072a966, gcc 8.3.0 -fPIC -Os)` -> `0.9+932`
pub fn parse_yosys_version(output: &str) -> PerfResult<String> {
    output
        .lines()
        .find_map(|l| l.trim().strip_prefix("Yosys "))
        .and_then(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .ok_or_else(|| PerfError::parse("yosys -V output", "Yosys <version>"))
}

/// `Vivado v2017.2 (64-bit)` -> `v2017.2`
pub fn parse_vivado_version(output: &str) -> PerfResult<String> {
    output
        .lines()
        .find_map(|l| l.trim().strip_prefix("Vivado "))
        .and_then(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .ok_or_else(|| PerfError::parse("vivado -version output", "Vivado v<version>"))
}

/// The `.comment` header iCEcube2 writes into the `.asc`:
///
/// ```text
/// .comment
/// Lattice
/// iCEcube2 2017.08.27940
/// ```
pub fn parse_icecube2_asc_version(asc: &str) -> PerfResult<String> {
    asc.lines()
        .find_map(|l| l.strip_prefix("iCEcube2"))
        .and_then(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .ok_or_else(|| PerfError::parse("iCEcube2 asc header", "iCEcube2 <version>"))
}

/// `ProductType=1.0.0.350.6` in Radiant's `data/ispsys.ini`.
pub fn parse_radiant_ini(ini: &str) -> PerfResult<String> {
    ini.lines()
        .find_map(|l| l.strip_prefix("ProductType"))
        .and_then(|rest| rest.split_once('='))
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PerfError::parse("radiant ispsys.ini", "ProductType=<version>"))
}

/// VPR prints a banner; the `Version:` line carries the build id.
pub fn parse_vpr_version(output: &str) -> PerfResult<String> {
    output
        .lines()
        .find_map(|l| l.trim().strip_prefix("Version:"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PerfError::parse("vpr --version output", "Version: <version>"))
}

/// First non-empty line, for tools without a stable version format.
pub fn first_line(output: &str) -> PerfResult<String> {
    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PerfError::parse("version output", "a non-empty line"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yosys() {
        assert_eq!(
            parse_yosys_version("Yosys 0.9+932 (git sha1 4072a966, gcc 8.3.0 -fPIC -Os)\n").unwrap(),
            "0.9+932"
        );
        assert!(parse_yosys_version("command not found").is_err());
    }

    #[test]
    fn test_vivado() {
        let out = "Vivado v2017.2 (64-bit)\nSW Build 1909853 on Thu Jun 15 18:39:10 MDT 2017\n";
        assert_eq!(parse_vivado_version(out).unwrap(), "v2017.2");
    }

    #[test]
    fn test_icecube2_asc() {
        let asc = ".comment\nLattice\niCEcube2 2017.08.27940\nPart: iCE40HX1K-TQ144\nDate: Jun 27 2018 13:22:06\n.device 1k\n";
        assert_eq!(parse_icecube2_asc_version(asc).unwrap(), "2017.08.27940");
        assert!(parse_icecube2_asc_version(".comment\nDiamondNG\n").is_err());
    }

    #[test]
    fn test_radiant_ini() {
        let ini = "[General]\nProductName=Radiant\nProductType=1.0.0.350.6\n";
        assert_eq!(parse_radiant_ini(ini).unwrap(), "1.0.0.350.6");
    }

    #[test]
    fn test_vpr() {
        let out = "\nVersatile Place and Route\nVersion: 8.0.0-dev+c4156f225\nRevision: v8.0.0-rc1\n";
        assert_eq!(parse_vpr_version(out).unwrap(), "8.0.0-dev+c4156f225");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("\n  arachne-pnr 0.1+203 \n").unwrap(), "arachne-pnr 0.1+203");
        assert!(first_line("   \n").is_err());
    }
}
