//! Built-in pattern catalog
//!
//! Embedded at compile time and validated once at startup. Unknown attack
//! kinds or elements fail while parsing; a malformed pattern fails here,
//! before any session can be created from it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::outcome::{ModifierTable, ResolverError};
use super::pattern::{AttackKind, FoldKind, FoldPattern, PatternError, TracePattern};
use crate::consts::FOLD_TIERS;

const BUILTIN_PATTERNS: &str = include_str!("../../assets/patterns.json");

/// Catalog load failures
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("no {0:?} fold patterns")]
    EmptyTier(FoldKind),
    #[error("duplicate trace pattern id `{0}`")]
    DuplicateId(String),
    #[error(transparent)]
    Resolver(#[from] ResolverError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FoldTiers {
    attack: Vec<FoldPattern>,
    defense: Vec<FoldPattern>,
}

/// Trace patterns plus attack and defense fold tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    traces: Vec<TracePattern>,
    folds: FoldTiers,
}

impl Catalog {
    /// The game's shipped patterns
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_PATTERNS)
    }

    /// Parse and validate a catalog
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        log::info!(
            "Catalog loaded: {} traces, {} attack folds, {} defense folds",
            catalog.traces.len(),
            catalog.folds.attack.len(),
            catalog.folds.defense.len()
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for (i, pattern) in self.traces.iter().enumerate() {
            pattern.validate()?;
            if self.traces[..i].iter().any(|p| p.id == pattern.id) {
                return Err(CatalogError::DuplicateId(pattern.id.clone()));
            }
        }
        for (kind, tier) in [
            (FoldKind::Attack, &self.folds.attack),
            (FoldKind::Defense, &self.folds.defense),
        ] {
            if tier.is_empty() {
                return Err(CatalogError::EmptyTier(kind));
            }
            for pattern in tier {
                pattern.validate()?;
            }
        }
        Ok(())
    }

    /// Every attack kind this catalog uses must have a payoff rule
    pub fn check_modifiers(&self, table: &ModifierTable) -> Result<(), CatalogError> {
        for pattern in &self.traces {
            if table.get(pattern.attack_kind).is_none() {
                return Err(ResolverError::MissingModifier(pattern.attack_kind.as_str()).into());
            }
        }
        Ok(())
    }

    pub fn traces(&self) -> &[TracePattern] {
        &self.traces
    }

    pub fn trace(&self, id: &str) -> Option<&TracePattern> {
        self.traces.iter().find(|p| p.id == id)
    }

    pub fn traces_of_kind(&self, kind: AttackKind) -> impl Iterator<Item = &TracePattern> {
        self.traces.iter().filter(move |p| p.attack_kind == kind)
    }

    /// Patterns that answer an enemy attack: lotus kinds plus the turtle
    pub fn defense_traces(&self) -> impl Iterator<Item = &TracePattern> {
        self.traces.iter().filter(|p| p.is_defensive() || p.id == "turtle")
    }

    /// Offensive trace patterns
    pub fn attack_traces(&self) -> impl Iterator<Item = &TracePattern> {
        self.traces.iter().filter(|p| !p.is_defensive())
    }

    pub fn folds(&self, kind: FoldKind) -> &[FoldPattern] {
        match kind {
            FoldKind::Attack => &self.folds.attack,
            FoldKind::Defense => &self.folds.defense,
        }
    }

    /// Fold pattern for a difficulty tier (1..=5); clamps into the tier range
    pub fn fold_tier(&self, kind: FoldKind, tier: u8) -> Option<&FoldPattern> {
        let tier = tier.clamp(1, FOLD_TIERS);
        let folds = self.folds(kind);
        folds
            .iter()
            .find(|p| p.difficulty == tier)
            .or_else(|| folds.get(usize::from(tier - 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::outcome::unmodified;
    use crate::sim::pattern::Element;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.traces().len(), 11);
        assert_eq!(catalog.folds(FoldKind::Attack).len(), 5);
        assert_eq!(catalog.folds(FoldKind::Defense).len(), 5);
        catalog.check_modifiers(&ModifierTable::standard()).unwrap();
    }

    #[test]
    fn test_lookups() {
        let catalog = Catalog::builtin().unwrap();
        let crane = catalog.trace("crane").unwrap();
        assert_eq!(crane.damage, 35);
        assert_eq!(crane.points.len(), 5);
        assert_eq!(crane.element, None);
        assert_eq!(catalog.trace("dragon").unwrap().element, Some(Element::Fire));
        assert!(catalog.trace("kraken").is_none());
        assert_eq!(catalog.traces_of_kind(AttackKind::Butterfly).count(), 2);

        let defense: Vec<_> = catalog.defense_traces().map(|p| p.id.as_str()).collect();
        assert_eq!(defense, ["lotus", "turtle"]);
        assert_eq!(catalog.attack_traces().count(), 9);
    }

    #[test]
    fn test_fold_tiers() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.fold_tier(FoldKind::Attack, 1).unwrap().name, "Crane Strike");
        assert_eq!(catalog.fold_tier(FoldKind::Attack, 5).unwrap().value, 100);
        assert_eq!(catalog.fold_tier(FoldKind::Defense, 9).unwrap().name, "Divine Protection");
        assert_eq!(
            catalog.fold_tier(FoldKind::Defense, 2).unwrap().element,
            Some(Element::Water)
        );
    }

    #[test]
    fn test_unknown_kind_fails_to_parse() {
        let json = r#"{
            "traces": [{"id": "x", "name": "X", "points": [[0, 0], [1, 1]],
                        "attack_kind": "tiger", "damage": 1, "time_limit": 5}],
            "folds": {"attack": [], "defense": []}
        }"#;
        assert!(matches!(Catalog::from_json(json), Err(CatalogError::Json(_))));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let json = r#"{
            "traces": [{"id": "x", "name": "X", "points": [[0, 0]],
                        "attack_kind": "crane", "damage": 1, "time_limit": 5}],
            "folds": {"attack": [], "defense": []}
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::Pattern(PatternError::TooFewPoints { .. }))
        ));
    }

    #[test]
    fn test_empty_tier_rejected() {
        let json = r#"{"traces": [], "folds": {"attack": [], "defense": []}}"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::EmptyTier(FoldKind::Attack))
        ));
    }

    #[test]
    fn test_missing_modifier_reported() {
        let catalog = Catalog::builtin().unwrap();
        let table = ModifierTable::new().with(AttackKind::Crane, unmodified);
        assert!(matches!(
            catalog.check_modifiers(&table),
            Err(CatalogError::Resolver(ResolverError::MissingModifier("dragon")))
        ));
    }
}
