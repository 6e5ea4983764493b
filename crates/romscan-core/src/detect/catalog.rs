/// ROM extension catalog — the default [`Detector`].
///
/// Maps well-known ROM dump extensions to the system they come from.
/// Generic dumps (`.rom`, `.bin`) are accepted without a system label.
use super::Detector;
use compact_str::CompactString;
use std::collections::HashSet;
use std::path::Path;

/// Systems recognised from file extensions alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomSystem {
    Nes,
    Snes,
    GameBoy,
    GameBoyColor,
    GameBoyAdvance,
    Nintendo64,
    NintendoDs,
    MegaDrive,
    MasterSystem,
    GameGear,
    PcEngine,
    Atari2600,
    Atari7800,
    Lynx,
    NeoGeoPocket,
    WonderSwan,
    /// Accepted dump with no system implied by the extension.
    Generic,
}

impl RomSystem {
    /// Human-readable label, used as the record's system field.
    pub fn label(self) -> &'static str {
        match self {
            Self::Nes => "Nintendo Entertainment System",
            Self::Snes => "Super Nintendo",
            Self::GameBoy => "Game Boy",
            Self::GameBoyColor => "Game Boy Color",
            Self::GameBoyAdvance => "Game Boy Advance",
            Self::Nintendo64 => "Nintendo 64",
            Self::NintendoDs => "Nintendo DS",
            Self::MegaDrive => "Sega Mega Drive",
            Self::MasterSystem => "Sega Master System",
            Self::GameGear => "Sega Game Gear",
            Self::PcEngine => "PC Engine",
            Self::Atari2600 => "Atari 2600",
            Self::Atari7800 => "Atari 7800",
            Self::Lynx => "Atari Lynx",
            Self::NeoGeoPocket => "Neo Geo Pocket",
            Self::WonderSwan => "WonderSwan",
            Self::Generic => "Unknown",
        }
    }

    /// Look up the system for a bare extension (no dot), case-insensitively.
    ///
    /// Lowercases into a stack buffer; extensions longer than 8 bytes are
    /// never ROM extensions and are rejected without allocating.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let bytes = ext.as_bytes();
        if bytes.is_empty() || bytes.len() > 8 {
            return None;
        }

        let mut lower = [0u8; 8];
        for (dest, &src) in lower.iter_mut().zip(bytes.iter()) {
            *dest = src.to_ascii_lowercase();
        }
        let lower_str = std::str::from_utf8(&lower[..bytes.len()]).ok()?;

        let system = match lower_str {
            "nes" | "fds" | "unf" | "unif" => Self::Nes,
            "sfc" | "smc" | "fig" | "swc" => Self::Snes,
            "gb" => Self::GameBoy,
            "gbc" => Self::GameBoyColor,
            "gba" | "agb" => Self::GameBoyAdvance,
            "n64" | "z64" | "v64" => Self::Nintendo64,
            "nds" => Self::NintendoDs,
            "md" | "gen" | "smd" | "32x" => Self::MegaDrive,
            "sms" => Self::MasterSystem,
            "gg" => Self::GameGear,
            "pce" | "sgx" => Self::PcEngine,
            "a26" => Self::Atari2600,
            "a78" => Self::Atari7800,
            "lnx" => Self::Lynx,
            "ngp" | "ngc" => Self::NeoGeoPocket,
            "ws" | "wsc" => Self::WonderSwan,
            "rom" | "bin" => Self::Generic,
            _ => return None,
        };
        Some(system)
    }
}

/// Extension-based detector: the built-in table plus configured extras.
#[derive(Debug, Clone, Default)]
pub struct ExtensionCatalog {
    /// Lowercased extensions (no dot) accepted on top of [`RomSystem`]'s table.
    extra: HashSet<String>,
}

impl ExtensionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept additional extensions. Leading dots and case are ignored.
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extra = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extra }
    }

    fn system_for(path: &Path) -> Option<RomSystem> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(RomSystem::from_extension)
    }
}

impl Detector for ExtensionCatalog {
    fn is_accepted_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        RomSystem::from_extension(ext).is_some()
            || (!self.extra.is_empty() && self.extra.contains(&ext.to_ascii_lowercase()))
    }

    fn detect_system(&self, path: &Path) -> Option<CompactString> {
        match Self::system_for(path)? {
            RomSystem::Generic => None,
            system => Some(CompactString::const_new(system.label())),
        }
    }
}
