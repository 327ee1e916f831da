//! Explicit conversion context threaded through the converter call chain

/// Which part of the asset the current diagnostics belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogDomain {
    /// Model container work
    #[default]
    Mdl,
    /// Hardware vertex-group work
    Vg,
}

impl LogDomain {
    /// The `log` target string for this domain
    pub fn target(self) -> &'static str {
        match self {
            LogDomain::Mdl => "studio_mdl::mdl",
            LogDomain::Vg => "studio_mdl::vg",
        }
    }
}

/// Context value passed down through a conversion.
///
/// Deeply nested relocation code annotates its diagnostics and adjusts
/// behavior during rig processing through this value instead of through
/// process-wide state, so independent file conversions stay reentrant.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertContext {
    /// Current diagnostic domain
    pub domain: LogDomain,
    /// Set while converting an animation rig rather than a full model
    pub rig_phase: bool,
}

impl ConvertContext {
    /// Context for a plain model conversion
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a rig conversion
    pub fn rig() -> Self {
        Self {
            domain: LogDomain::Mdl,
            rig_phase: true,
        }
    }

    /// Derived context scoped to the vertex-group sub-phase
    pub fn vg(self) -> Self {
        Self {
            domain: LogDomain::Vg,
            ..self
        }
    }

    /// The `log` target for the current domain
    pub fn target(&self) -> &'static str {
        self.domain.target()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_vg_context() {
        let ctx = ConvertContext::rig();
        assert!(ctx.rig_phase);
        assert_eq!(ctx.domain, LogDomain::Mdl);

        let vg = ctx.vg();
        assert_eq!(vg.domain, LogDomain::Vg);
        // Rig phase carries into the sub-phase; the original context is untouched
        assert!(vg.rig_phase);
        assert_eq!(ctx.domain, LogDomain::Mdl);
    }
}
