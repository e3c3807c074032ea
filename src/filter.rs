use std::collections::{BTreeMap, BTreeSet};

use crate::constants::ALL_SENTINEL;
use crate::models::{Field, ReplayRecord};

/// A field-to-allowed-values constraint set. Fields without an entry are
/// unrestricted.
pub trait FilterSelection {
    fn permits(&self, record: &ReplayRecord) -> bool;

    fn update(&mut self, field: Field, value: &str);

    /// Whether the control for `(field, value)` should render as pressed.
    fn is_selected(&self, field: Field, value: &str) -> bool;

    fn clear(&mut self);

    fn is_unrestricted(&self) -> bool;
}

/// Keeps the relative order of the records that pass.
pub fn apply_filters<F, T>(selection: &F, records: &[T]) -> Vec<T>
where
    F: FilterSelection + ?Sized,
    T: AsRef<ReplayRecord> + Clone,
{
    if selection.is_unrestricted() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| selection.permits((*record).as_ref()))
        .cloned()
        .collect()
}

fn matches_value(record: &ReplayRecord, field: Field, allowed: impl Fn(&str) -> bool) -> bool {
    record
        .get(field)
        .map(|value| allowed(&*value.filter_key()))
        .unwrap_or(false)
}

/// Radio-style selection: one value per field, `"All"` meaning unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingleSelect {
    values: BTreeMap<Field, String>,
}

impl SingleSelect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds every field with the `"All"` sentinel.
    pub fn with_fields(fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            values: fields
                .into_iter()
                .map(|field| (field, ALL_SENTINEL.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }
}

impl FilterSelection for SingleSelect {
    fn permits(&self, record: &ReplayRecord) -> bool {
        self.values
            .iter()
            .filter(|(_, value)| value.as_str() != ALL_SENTINEL)
            .all(|(field, value)| matches_value(record, *field, |key| key == value.as_str()))
    }

    fn update(&mut self, field: Field, value: &str) {
        self.values.insert(field, value.to_string());
    }

    fn is_selected(&self, field: Field, value: &str) -> bool {
        self.get(field).unwrap_or(ALL_SENTINEL) == value
    }

    fn clear(&mut self) {
        for value in self.values.values_mut() {
            *value = ALL_SENTINEL.to_string();
        }
    }

    fn is_unrestricted(&self) -> bool {
        self.values.values().all(|value| value == ALL_SENTINEL)
    }
}

/// Checkbox-style selection: a set of values per field. Removing a field's
/// last value deletes the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiSelect {
    values: BTreeMap<Field, BTreeSet<String>>,
}

impl MultiSelect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<&BTreeSet<String>> {
        self.values.get(&field)
    }

    pub fn contains_field(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }
}

impl FilterSelection for MultiSelect {
    fn permits(&self, record: &ReplayRecord) -> bool {
        self.values.iter().all(|(field, allowed)| {
            allowed.is_empty() || matches_value(record, *field, |key| allowed.contains(key))
        })
    }

    fn update(&mut self, field: Field, value: &str) {
        let allowed = self.values.entry(field).or_default();
        if !allowed.remove(value) {
            allowed.insert(value.to_string());
        }
        if allowed.is_empty() {
            self.values.remove(&field);
        }
    }

    fn is_selected(&self, field: Field, value: &str) -> bool {
        self.values
            .get(&field)
            .map(|allowed| allowed.contains(value))
            .unwrap_or(false)
    }

    fn clear(&mut self) {
        self.values.clear();
    }

    fn is_unrestricted(&self) -> bool {
        self.values.values().all(BTreeSet::is_empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Single,
    Multi,
}

/// The selection shape a page committed to at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Single(SingleSelect),
    Multi(MultiSelect),
}

impl Selection {
    pub fn new(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Single => Selection::Single(SingleSelect::new()),
            FilterMode::Multi => Selection::Multi(MultiSelect::new()),
        }
    }

    pub fn mode(&self) -> FilterMode {
        match self {
            Selection::Single(_) => FilterMode::Single,
            Selection::Multi(_) => FilterMode::Multi,
        }
    }

    fn inner(&self) -> &dyn FilterSelection {
        match self {
            Selection::Single(selection) => selection,
            Selection::Multi(selection) => selection,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn FilterSelection {
        match self {
            Selection::Single(selection) => selection,
            Selection::Multi(selection) => selection,
        }
    }
}

impl FilterSelection for Selection {
    fn permits(&self, record: &ReplayRecord) -> bool {
        self.inner().permits(record)
    }

    fn update(&mut self, field: Field, value: &str) {
        self.inner_mut().update(field, value);
    }

    fn is_selected(&self, field: Field, value: &str) -> bool {
        self.inner().is_selected(field, value)
    }

    fn clear(&mut self) {
        self.inner_mut().clear();
    }

    fn is_unrestricted(&self) -> bool {
        self.inner().is_unrestricted()
    }
}
