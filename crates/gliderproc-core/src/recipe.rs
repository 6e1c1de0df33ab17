// crates/gliderproc-core/src/recipe.rs

use tracing::warn;

/// One correction stage the pipeline may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionToken {
    /// First-order sensor-lag correction of temperature.
    SensorLagTemperature,
    /// First-order sensor-lag correction of conductivity.
    SensorLagConductivity,
    /// Thermal-lag correction of the conductivity cell and derived salinity.
    ThermalLag,
}

impl CorrectionToken {
    pub fn as_str(self) -> &'static str {
        match self {
            CorrectionToken::SensorLagTemperature => "T",
            CorrectionToken::SensorLagConductivity => "C",
            CorrectionToken::ThermalLag => "TH",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "T" => Some(CorrectionToken::SensorLagTemperature),
            "C" => Some(CorrectionToken::SensorLagConductivity),
            "TH" => Some(CorrectionToken::ThermalLag),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenRemoval {
    pub token: CorrectionToken,
    pub reason: String,
}

/// The ordered set of corrections to attempt, parsed from an underscore-delimited
/// configuration string such as `"T_C_TH"`. Tokens may be dropped while the
/// pipeline runs (for example when a time constant cannot be identified); every
/// removal is kept on an audit log with its reason.
#[derive(Debug, Clone, Default)]
pub struct CorrectionRecipe {
    tokens: Vec<CorrectionToken>,
    removals: Vec<TokenRemoval>,
}

impl CorrectionRecipe {
    pub fn parse(spec: &str) -> Self {
        let mut tokens = Vec::new();
        for part in spec.split('_').filter(|p| !p.is_empty()) {
            match CorrectionToken::parse(part) {
                Some(token) if !tokens.contains(&token) => tokens.push(token),
                Some(_) => {}
                None => warn!(token = part, "unknown correction token ignored"),
            }
        }
        Self {
            tokens,
            removals: Vec::new(),
        }
    }

    pub fn contains(&self, token: CorrectionToken) -> bool {
        self.tokens.contains(&token)
    }

    pub fn drop_token(&mut self, token: CorrectionToken, reason: impl Into<String>) {
        let reason = reason.into();
        if let Some(pos) = self.tokens.iter().position(|t| *t == token) {
            self.tokens.remove(pos);
            warn!(token = token.as_str(), %reason, "correction token dropped");
            self.removals.push(TokenRemoval { token, reason });
        }
    }

    pub fn tokens(&self) -> &[CorrectionToken] {
        &self.tokens
    }

    pub fn removals(&self) -> &[TokenRemoval] {
        &self.removals
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
