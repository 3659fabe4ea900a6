//! Selection-to-dataset binding.
//!
//! A [`DatasetBinding`] turns the current selections of a set of layouts
//! into the key of the dataset to show. A [`LockTable`] holds the
//! cross-field rules that pin and lock a layout whenever the other
//! selections leave the region where its choices exist on disk.
//!
//! Template syntax:
//! - `{layout}` expands to the active member of `layout` (or its alias)
//! - `{layout:Member}` expands to `True`/`False` for that member's flag
//! - `{a+b}` expands to the sum of the numeric active members of `a` and `b`
//! - everything else is copied literally

use crate::data::layout::{find_layout, find_layout_mut, Layout};
use crate::error::{ViewerError, ViewerResult};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Choice { layout: String },
    Flag { layout: String, member: String },
    Sum { layouts: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl KeyTemplate {
    pub fn parse(source: &str) -> ViewerResult<Self> {
        let bad = |why: &str| ViewerError::invalid(format!("key template '{}': {}", source, why));
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            if rest[..open].contains('}') {
                return Err(bad("unmatched '}'"));
            }
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| bad("unclosed '{'"))?;
            let inner = after[..close].trim();
            if inner.is_empty() || inner.contains('{') {
                return Err(bad("empty or nested placeholder"));
            }
            let segment = match inner.split_once(':') {
                Some((layout, member)) => {
                    let (layout, member) = (layout.trim(), member.trim());
                    if layout.is_empty() || member.is_empty() {
                        return Err(bad("placeholder needs both layout and member"));
                    }
                    Segment::Flag {
                        layout: layout.to_string(),
                        member: member.to_string(),
                    }
                }
                None if inner.contains('+') => {
                    let layouts: Vec<String> =
                        inner.split('+').map(|l| l.trim().to_string()).collect();
                    if layouts.iter().any(String::is_empty) {
                        return Err(bad("empty term in sum"));
                    }
                    Segment::Sum { layouts }
                }
                None => Segment::Choice {
                    layout: inner.to_string(),
                },
            };
            segments.push(segment);
            rest = &after[close + 1..];
        }
        if rest.contains('}') {
            return Err(bad("unmatched '}'"));
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        if !segments.iter().any(|s| !matches!(s, Segment::Literal(_))) {
            return Err(bad("no placeholders"));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Layout names referenced by placeholders, in template order
    pub fn layouts(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            let referenced: Vec<&str> = match segment {
                Segment::Literal(_) => continue,
                Segment::Choice { layout } | Segment::Flag { layout, .. } => vec![layout.as_str()],
                Segment::Sum { layouts } => layouts.iter().map(String::as_str).collect(),
            };
            for name in referenced {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

impl FromStr for KeyTemplate {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// layout name -> member label -> text used in the key
pub type AliasMap = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Clone)]
pub struct DatasetBinding {
    template: KeyTemplate,
    aliases: AliasMap,
}

impl DatasetBinding {
    pub fn new(template: KeyTemplate, aliases: AliasMap) -> Self {
        Self { template, aliases }
    }

    /// Build the dataset key for the current selections. Pure: layouts are
    /// only read.
    pub fn dataset_key(&self, layouts: &[Layout]) -> ViewerResult<String> {
        let mut key = String::new();
        for segment in &self.template.segments {
            match segment {
                Segment::Literal(text) => key.push_str(text),
                Segment::Choice { layout } => {
                    let chosen = find_layout(layouts, layout)?.single_active()?.label();
                    let text = self
                        .aliases
                        .get(layout)
                        .and_then(|names| names.get(chosen))
                        .map(String::as_str)
                        .unwrap_or(chosen);
                    key.push_str(text);
                }
                Segment::Flag { layout, member } => {
                    let active = find_layout(layouts, layout)?.by_key(member)?.is_active();
                    key.push_str(if active { "True" } else { "False" });
                }
                Segment::Sum { layouts: terms } => {
                    let mut total: i64 = 0;
                    for layout in terms {
                        total += numeric_choice(layouts, layout)?;
                    }
                    key.push_str(&total.to_string());
                }
            }
        }
        Ok(key)
    }

    /// Check every placeholder resolves against `layouts`
    pub fn validate(&self, layouts: &[Layout]) -> ViewerResult<()> {
        for segment in &self.template.segments {
            match segment {
                Segment::Literal(_) => {}
                Segment::Choice { layout } => {
                    find_layout(layouts, layout)?;
                }
                Segment::Flag { layout, member } => {
                    find_layout(layouts, layout)?.by_key(member)?;
                }
                Segment::Sum { layouts: terms } => {
                    for layout in terms {
                        let target = find_layout(layouts, layout)?;
                        if let Some(label) = target
                            .widgets()
                            .iter()
                            .map(|w| w.label())
                            .find(|label| label.parse::<i64>().is_err())
                        {
                            return Err(ViewerError::invalid(format!(
                                "layout '{}' is summed but member '{}' is not a number",
                                layout, label
                            )));
                        }
                    }
                }
            }
        }
        for (layout, names) in &self.aliases {
            let target = find_layout(layouts, layout)?;
            for label in names.keys() {
                target.by_key(label)?;
            }
        }
        Ok(())
    }
}

fn numeric_choice(layouts: &[Layout], layout: &str) -> ViewerResult<i64> {
    let chosen = find_layout(layouts, layout)?.single_active()?.label();
    chosen.parse().map_err(|_| {
        ViewerError::invalid(format!(
            "layout '{}' selection '{}' is not a number",
            layout, chosen
        ))
    })
}

/// One cross-field rule: `target` is free only while every `valid_when`
/// condition holds; otherwise its members are pinned to `forced` and the
/// layout is locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRule {
    /// (layout, label that must be active)
    pub valid_when: Vec<(String, String)>,
    pub target: String,
    /// (member, forced active flag)
    pub forced: Vec<(String, bool)>,
}

impl LockRule {
    pub fn holds(&self, layouts: &[Layout]) -> ViewerResult<bool> {
        for (layout, label) in &self.valid_when {
            if !find_layout(layouts, layout)?.by_key(label)?.is_active() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Lock or unlock the target. Returns true when the target ends up locked.
    pub fn apply(&self, layouts: &mut [Layout]) -> ViewerResult<bool> {
        let valid = self.holds(layouts)?;
        let target = find_layout_mut(layouts, &self.target)?;
        if valid {
            if target.is_locked() {
                tracing::debug!(layout = %self.target, "unlocking");
            }
            target.unlock();
            return Ok(false);
        }
        for (member, active) in &self.forced {
            target.by_key_mut(member)?.set_active(*active);
        }
        if !target.is_locked() {
            tracing::debug!(layout = %self.target, "locking");
        }
        target.lock();
        Ok(true)
    }

    fn validate(&self, layouts: &[Layout]) -> ViewerResult<()> {
        for (layout, label) in &self.valid_when {
            find_layout(layouts, layout)?.by_key(label)?;
        }
        let target = find_layout(layouts, &self.target)?;
        for (member, _) in &self.forced {
            target.by_key(member)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LockTable {
    rules: Vec<LockRule>,
}

impl LockTable {
    pub fn new(rules: Vec<LockRule>) -> Self {
        Self { rules }
    }

    /// Evaluate every rule in order
    pub fn apply(&self, layouts: &mut [Layout]) -> ViewerResult<()> {
        for rule in &self.rules {
            rule.apply(layouts)?;
        }
        Ok(())
    }

    pub fn validate(&self, layouts: &[Layout]) -> ViewerResult<()> {
        self.rules.iter().try_for_each(|rule| rule.validate(layouts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::input::{InputEvent, PointerState};
    use crate::data::layout::{LayoutSpec, SelectionPolicy};

    fn sampling_layouts() -> Vec<Layout> {
        vec![
            Layout::new(LayoutSpec::new("coarse", ["0", "64"]).active([1])).unwrap(),
            Layout::new(LayoutSpec::new("fine", ["16", "32", "64", "128"]).active([3])).unwrap(),
            Layout::new(
                LayoutSpec::new("ablation", ["Pos encoding", "View direction"])
                    .active([0, 1])
                    .policy(SelectionPolicy::Multi),
            )
            .unwrap(),
        ]
    }

    fn sampling_binding() -> DatasetBinding {
        DatasetBinding::new(
            KeyTemplate::parse(
                "lego_pos_encoding_{ablation:Pos encoding}_view_dirs_{ablation:View direction}_64_{fine}",
            )
            .unwrap(),
            AliasMap::new(),
        )
    }

    fn ablation_rule() -> LockTable {
        LockTable::new(vec![LockRule {
            valid_when: vec![
                ("coarse".into(), "64".into()),
                ("fine".into(), "128".into()),
            ],
            target: "ablation".into(),
            forced: vec![("Pos encoding".into(), true), ("View direction".into(), true)],
        }])
    }

    fn click(layouts: &mut [Layout], layout: &str, member: &str) -> bool {
        let target = find_layout_mut(layouts, layout).unwrap();
        let (x, y) = target.by_key(member).unwrap().center();
        let mut pointer = PointerState::default();
        pointer.press(x, y);
        target.update(&InputEvent::pointer_button(0, 0, true), &pointer);
        pointer.release(x, y);
        target.update(&InputEvent::pointer_button(0, 0, false), &pointer)
    }

    #[test]
    fn test_template_parsing() {
        let t = KeyTemplate::parse("{dataset}_{model}").unwrap();
        assert_eq!(t.layouts(), vec!["dataset", "model"]);
        assert_eq!(t.to_string(), "{dataset}_{model}");

        let flag = KeyTemplate::parse("{model:HNGAN + aug}").unwrap();
        assert_eq!(flag.layouts(), vec!["model"]);
        let sum = KeyTemplate::parse("Total: {coarse + fine}").unwrap();
        assert_eq!(sum.layouts(), vec!["coarse", "fine"]);

        for bad in ["plain", "{open", "close}", "{}", "{a:}", "a}{b}", "{a{b}}", "{a+}"] {
            assert!(
                matches!(KeyTemplate::parse(bad), Err(ViewerError::InvalidConfiguration(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_sampling_key() {
        let layouts = sampling_layouts();
        assert_eq!(
            sampling_binding().dataset_key(&layouts).unwrap(),
            "lego_pos_encoding_True_view_dirs_True_64_128"
        );
    }

    #[test]
    fn test_aliases_substitute_labels() {
        let layouts = vec![
            Layout::new(LayoutSpec::new("dataset", ["Chest", "Knee"]).active([1])).unwrap(),
            Layout::new(
                LayoutSpec::new("model", ["Mednerf", "HNGAN + aug"]).active([1]),
            )
            .unwrap(),
        ];
        let mut aliases = AliasMap::new();
        aliases.insert(
            "dataset".into(),
            HashMap::from([("Chest".into(), "chest".into()), ("Knee".into(), "knee".into())]),
        );
        aliases.insert(
            "model".into(),
            HashMap::from([("HNGAN + aug".into(), "nerfgan_aug".into())]),
        );
        let binding = DatasetBinding::new(KeyTemplate::parse("{dataset}_{model}").unwrap(), aliases);
        binding.validate(&layouts).unwrap();
        assert_eq!(binding.dataset_key(&layouts).unwrap(), "knee_nerfgan_aug");
    }

    #[test]
    fn test_key_errors() {
        let layouts = vec![Layout::new(LayoutSpec::new("model", ["a", "b"])).unwrap()];
        let empty = DatasetBinding::new(KeyTemplate::parse("x_{model}").unwrap(), AliasMap::new());
        assert!(matches!(
            empty.dataset_key(&layouts),
            Err(ViewerError::EmptySelection(_))
        ));

        let missing = DatasetBinding::new(KeyTemplate::parse("{nope}").unwrap(), AliasMap::new());
        assert!(missing.dataset_key(&layouts).unwrap_err().is_not_found());
        assert!(missing.validate(&layouts).unwrap_err().is_not_found());

        let bad_member =
            DatasetBinding::new(KeyTemplate::parse("{model:c}").unwrap(), AliasMap::new());
        assert!(bad_member.validate(&layouts).unwrap_err().is_not_found());
    }

    #[test]
    fn test_dependent_lock_scenario() {
        let mut layouts = sampling_layouts();
        let binding = sampling_binding();
        let rules = ablation_rule();
        rules.validate(&layouts).unwrap();

        // Valid region: ablation free, user turns positional encoding off
        rules.apply(&mut layouts).unwrap();
        assert!(!find_layout(&layouts, "ablation").unwrap().is_locked());
        assert!(click(&mut layouts, "ablation", "Pos encoding"));
        rules.apply(&mut layouts).unwrap();
        assert_eq!(
            binding.dataset_key(&layouts).unwrap(),
            "lego_pos_encoding_False_view_dirs_True_64_128"
        );

        // Leaving the region pins both flags and locks the layout
        assert!(click(&mut layouts, "fine", "32"));
        rules.apply(&mut layouts).unwrap();
        let ablation = find_layout(&layouts, "ablation").unwrap();
        assert!(ablation.is_locked());
        assert_eq!(ablation.active_members().len(), 2);
        assert_eq!(
            binding.dataset_key(&layouts).unwrap(),
            "lego_pos_encoding_True_view_dirs_True_64_32"
        );

        // Locked layout ignores clicks
        assert!(!click(&mut layouts, "ablation", "View direction"));

        // Back inside: unlocked, flags untouched
        assert!(click(&mut layouts, "fine", "128"));
        rules.apply(&mut layouts).unwrap();
        let ablation = find_layout(&layouts, "ablation").unwrap();
        assert!(!ablation.is_locked());
        assert_eq!(ablation.active_members().len(), 2);
    }

    #[test]
    fn test_coarse_zero_also_locks() {
        let mut layouts = sampling_layouts();
        find_layout_mut(&mut layouts, "ablation")
            .unwrap()
            .by_key_mut("View direction")
            .unwrap()
            .set_active(false);
        assert!(click(&mut layouts, "coarse", "0"));
        ablation_rule().apply(&mut layouts).unwrap();
        assert_eq!(
            sampling_binding().dataset_key(&layouts).unwrap(),
            "lego_pos_encoding_True_view_dirs_True_64_128"
        );
        assert!(find_layout(&layouts, "ablation").unwrap().is_locked());
    }

    #[test]
    fn test_summed_selections() {
        let mut layouts = sampling_layouts();
        let total = DatasetBinding::new(
            KeyTemplate::parse("Total number of samples: {coarse+fine}").unwrap(),
            AliasMap::new(),
        );
        total.validate(&layouts).unwrap();
        assert_eq!(
            total.dataset_key(&layouts).unwrap(),
            "Total number of samples: 192"
        );

        assert!(click(&mut layouts, "coarse", "0"));
        assert!(click(&mut layouts, "fine", "16"));
        assert_eq!(
            total.dataset_key(&layouts).unwrap(),
            "Total number of samples: 16"
        );

        let words = DatasetBinding::new(
            KeyTemplate::parse("{fine+ablation}").unwrap(),
            AliasMap::new(),
        );
        assert!(matches!(
            words.validate(&layouts),
            Err(ViewerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_lock_rule_validation() {
        let layouts = sampling_layouts();
        let table = LockTable::new(vec![LockRule {
            valid_when: vec![("fine".into(), "256".into())],
            target: "ablation".into(),
            forced: vec![],
        }]);
        assert!(table.validate(&layouts).unwrap_err().is_not_found());
    }
}
