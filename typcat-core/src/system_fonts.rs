//! Fonts the operating system depends on (made by FontLab https://www.fontlab.com/)
//!
//! Names are stored normalized (lowercase, no spaces, hyphens, or
//! underscores), covering both family names and common file stems.

use crate::matching::normalize_name;

/// Which platform list to consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// The platform this binary was built for, if it has a list.
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "windows") {
            Some(Platform::Windows)
        } else if cfg!(target_os = "macos") {
            Some(Platform::MacOs)
        } else if cfg!(target_os = "linux") {
            Some(Platform::Linux)
        } else {
            None
        }
    }

    fn fonts(self) -> &'static [&'static str] {
        match self {
            Platform::Windows => WINDOWS,
            Platform::MacOs => MACOS,
            Platform::Linux => LINUX,
        }
    }
}

/// True when `name` is a critical system font on any platform.
///
/// Used to keep installed-font matching away from OS fonts that happen to
/// share a name with a catalog entry.
pub fn is_critical_system_font(name: &str) -> bool {
    let key = normalize_name(name);
    [Platform::Windows, Platform::MacOs, Platform::Linux]
        .into_iter()
        .any(|platform| platform.fonts().contains(&key.as_str()))
}

/// True when `name` is a critical system font on the current platform only.
pub fn is_platform_system_font(name: &str) -> bool {
    Platform::current().is_some_and(|platform| is_system_font_on(platform, name))
}

pub fn is_system_font_on(platform: Platform, name: &str) -> bool {
    platform.fonts().contains(&normalize_name(name).as_str())
}

const WINDOWS: &[&str] = &[
    "segoeui", "segoeuibold", "segoeuiitalic", "segoeuibolditalic", "segoeuivariable",
    "microsoftsansserif", "tahoma", "mssansserif", "marlett", "segoefluenticons",
    "segoemdl2assets", "segoeuisymbol", "wingdings", "wingdings2", "wingdings3", "webdings",
    "symbol", "arial", "arialbold", "arialitalic", "arialbolditalic", "arialblack", "times",
    "timesnewroman", "timesnewromanpsmt", "courier", "couriernew", "verdana", "trebuchetms",
    "trebuchetmsbold", "trebuchetmsitalic", "trebuchetmsbolditalic", "georgia", "georgiabold",
    "georgiaitalic", "georgiabolditalic", "calibri", "calibribold", "calibriitalic",
    "calibribolditalic", "cambria", "candara", "consolas", "constantia", "corbel",
    "lucidaconsole", "segoeuiemoji", "meiryo", "yugothic", "msgothic", "msmincho", "simsun",
    "simhei", "mingliub", "pmingliu", "malgungothic", "gulim", "batang", "msjh", "msjhbd",
    "msjhl", "msyh", "msyhbd", "msyhl", "cambriamath", "framd", "msgothicui", "msuigothic",
    "seguisb", "seguili", "seguisl", "arialunicode", "comicsansms", "comicsansmsbold", "impact",
    "palatino", "palatinolinotype", "bookantiqua", "centurygothic", "franklingothic",
    "gillsans", "gillsansmt", "garamond", "garamonditalic", "garamondbold",
    "garamondbolditalic",
];

const MACOS: &[&str] = &[
    "sfpro", "sfprodisplay", "sfprotext", "sfprorounded", "sfcompact", "sfmono", "sanfrancisco",
    "sfnsdisplay", "sfnsrounded", "sfnstext", "systemfont", "sfarabic", "sfarmenian",
    "sfhebrew", "sfsymbols", "helvetica", "helveticaneue", "lucidagrande", "geneva", "monaco",
    "menlo", "chicago", "arial", "arialblack", "times", "timesnewroman", "courier",
    "couriernew", "palatino", "baskerville", "optima", "optimabold", "optimaitalic",
    "optimabolditalic", "didot", "americantypewriter", "hoeflertext", "applecoloremoji",
    "applesymbols", "hiraginosans", "hiraginomincho", "pingfangsc", "pingfangtc", "heitisc",
    "heititc", "songtisc", "songtitc", "applesdgothicneo", "osaka", "stixgeneral",
    "stixsizeonesym", "stixsizetwosym", "stixsizethreesym", "stixsizefoursym", "applebraille",
    "lastresort", "cambria", "bookantiqua", "centurygothic", "trebuchetms", "verdana",
    "georgia", "comicsansms", "impact", "tahoma", "myriad", "myriadpro", "myriadset",
    "myriadsemibold", "myriadsemibolditalic", "athelas", "seravek", "seraveklight",
    "seravekmedium", "seraveksemibold", "seravekbold", "applegaramond", "garamond",
    "garamonditalic", "garamondbold", "garamondbolditalic", "futura", "futurabold",
    "futuraitalic", "futurabolditalic",
];

const LINUX: &[&str] = &[
    "ubuntu", "ubuntumono", "ubuntubold", "ubuntuitalic", "ubuntubolditalic", "dejavusans",
    "dejavusansmono", "dejavuserif", "cantarell", "cantarellbold", "cantarellitalic",
    "cantarellbolditalic", "symbola", "liberationsans", "liberationserif", "liberationmono",
    "notosans", "notoserif", "notosansmono", "notocoloremoji", "terminus", "hack", "firacode",
    "firafonts", "firamonospace",
];
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_fonts_match_after_normalization() {
        assert!(is_critical_system_font("Arial"));
        assert!(is_critical_system_font("Segoe UI"));
        assert!(is_critical_system_font("helvetica-neue"));
        assert!(is_critical_system_font("DejaVu_Sans"));
        assert!(!is_critical_system_font("Roboto"));
        assert!(!is_critical_system_font(""));
    }

    #[test]
    fn platform_lists_are_separate() {
        assert!(is_system_font_on(Platform::Linux, "Ubuntu Mono"));
        assert!(!is_system_font_on(Platform::Windows, "Ubuntu Mono"));
        assert!(is_system_font_on(Platform::MacOs, "SF Pro"));
        assert!(is_system_font_on(Platform::Windows, "Times New Roman"));
    }

    #[test]
    fn lists_are_stored_normalized() {
        for platform in [Platform::Windows, Platform::MacOs, Platform::Linux] {
            for name in platform.fonts() {
                assert_eq!(normalize_name(name), *name);
            }
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn current_platform_on_linux() {
        assert!(is_platform_system_font("Cantarell"));
        assert!(!is_platform_system_font("Segoe UI"));
    }
}
