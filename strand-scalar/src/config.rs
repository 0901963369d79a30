use once_cell::race::OnceBox;
use strand_dtype::NumberLayout;
use strand_error::{StrandResult, strand_bail};

/// Environment variable read for [`EngineConfig::empty_text_is_null`].
pub const EMPTY_TEXT_IS_NULL_ENV: &str = "STRAND_EMPTY_TEXT_IS_NULL";
/// Environment variable read for [`EngineConfig::compatible_formatting`].
pub const COMPATIBLE_FORMATTING_ENV: &str = "STRAND_COMPATIBLE_FORMATTING";

static GLOBAL: OnceBox<EngineConfig> = OnceBox::new();

/// Process-wide switches that change how values are interpreted.
///
/// The configuration is fixed for the life of the process: either installed explicitly with
/// [`EngineConfig::install`] before the first value is touched, or read from the environment on
/// first use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// An empty TEXT value is treated as null for null detection, comparison and hashing.
    pub empty_text_is_null: bool,
    /// Mask-less numbers render in their plain shortest form instead of the sign-slot layout.
    pub compatible_formatting: bool,
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| {
        matches!(
            v.trim().to_ascii_uppercase().as_str(),
            "Y" | "YES" | "TRUE" | "1"
        )
    })
}

impl EngineConfig {
    /// Read the configuration from the environment.
    pub fn from_env() -> Self {
        Self {
            empty_text_is_null: env_flag(EMPTY_TEXT_IS_NULL_ENV),
            compatible_formatting: env_flag(COMPATIBLE_FORMATTING_ENV),
        }
    }

    /// Make this the process-wide configuration.
    ///
    /// Fails if a configuration was already installed or already read from the environment.
    pub fn install(self) -> StrandResult<()> {
        if GLOBAL.set(Box::new(self)).is_err() {
            strand_bail!(InvalidArgument: "engine configuration is already initialized");
        }
        log::debug!("installed engine configuration {:?}", self);
        Ok(())
    }

    /// The process-wide configuration.
    pub fn global() -> &'static EngineConfig {
        GLOBAL.get_or_init(|| Box::new(Self::from_env()))
    }

    /// The layout used for numbers rendered without a mask.
    pub fn number_layout(&self) -> NumberLayout {
        if self.compatible_formatting {
            NumberLayout::Plain
        } else {
            NumberLayout::SignSlot
        }
    }
}
