//! The province → regency → district → village selector chain.
//!
//! Each level tracks its own option list, the parent id that list was loaded
//! for, and a generation counter. Every fetch is described by a
//! [`LookupTicket`]; a response is applied only while its ticket is still the
//! latest one issued for that level and parent.

use tracing::{debug, warn};

use crate::domain::{FieldValue, GeneralField, GeneralInfo, LookupOption, RegionLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupStatus {
    #[default]
    Empty,
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct LevelState {
    status: LookupStatus,
    options: Vec<LookupOption>,
    parent_id: Option<String>,
    generation: u64,
    selected: Option<String>,
}

impl LevelState {
    pub fn status(&self) -> LookupStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LookupStatus::Loading
    }

    pub fn options(&self) -> &[LookupOption] {
        &self.options
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_option(&self) -> Option<&LookupOption> {
        let selected = self.selected.as_deref()?;
        self.options.iter().find(|option| option.value == selected)
    }

    fn reset(&mut self) {
        self.status = LookupStatus::Empty;
        self.options.clear();
        self.parent_id = None;
        self.selected = None;
        self.generation += 1;
    }

    fn begin(&mut self, level: RegionLevel, parent_id: Option<String>) -> LookupTicket {
        self.generation += 1;
        self.status = LookupStatus::Loading;
        self.options.clear();
        self.parent_id = parent_id.clone();
        LookupTicket {
            level,
            parent_id,
            generation: self.generation,
        }
    }
}

/// Identifies one outstanding option-list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub level: RegionLevel,
    /// `None` only for the province level.
    pub parent_id: Option<String>,
    pub generation: u64,
}

/// Error surfaced by a lookup source; lookups degrade rather than fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct LookupResponse {
    pub ticket: LookupTicket,
    pub result: Result<Vec<LookupOption>, LookupFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupApplied {
    Loaded(usize),
    Failed,
    /// The ticket was superseded; the response was dropped.
    Stale,
}

/// Result of a user picking (or clearing) a selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Edits for the general-info engine. Deeper levels are cleared by the
    /// engine's dependency graph.
    pub edits: Vec<(GeneralField, Option<FieldValue>)>,
    /// Fetch to issue for the child level, if any.
    pub lookup: Option<LookupTicket>,
}

#[derive(Debug, Clone, Default)]
pub struct RegionChain {
    levels: [LevelState; 4],
}

impl RegionChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, level: RegionLevel) -> &LevelState {
        &self.levels[level.index()]
    }

    /// Starts loading the province list.
    pub fn load_root(&mut self) -> LookupTicket {
        self.levels[RegionLevel::Province.index()].begin(RegionLevel::Province, None)
    }

    /// User-driven selection: records the choice, empties every deeper level,
    /// and asks for the child level's options.
    pub fn apply_user_selection(
        &mut self,
        level: RegionLevel,
        option: Option<LookupOption>,
    ) -> Selection {
        let state = &mut self.levels[level.index()];
        let next_value = option.as_ref().map(|option| option.value.clone());
        if state.selected == next_value {
            debug!(%level, "selection unchanged");
            // Same id: only the label may have moved; the engine skips it if not.
            let edits = option
                .map(|option| vec![(level.name_field(), Some(FieldValue::Text(option.label)))])
                .unwrap_or_default();
            return Selection {
                edits,
                lookup: None,
            };
        }
        state.selected = next_value;

        for descendant in level.descendants() {
            self.levels[descendant.index()].reset();
        }

        let edits = match &option {
            Some(option) => vec![
                (level.id_field(), Some(FieldValue::Text(option.value.clone()))),
                (level.name_field(), Some(FieldValue::Text(option.label.clone()))),
            ],
            None => vec![(level.id_field(), None), (level.name_field(), None)],
        };

        let lookup = match (option, level.child()) {
            (Some(option), Some(child)) => {
                Some(self.levels[child.index()].begin(child, Some(option.value)))
            }
            _ => None,
        };

        Selection { edits, lookup }
    }

    /// Edit-mode initialization from an existing record. Selections are taken
    /// as-is (nothing is cleared) and every level whose parent is known gets a
    /// preload ticket.
    pub fn seed_from_existing(&mut self, record: &GeneralInfo) -> Vec<LookupTicket> {
        let ids = [
            record.province_id.clone(),
            record.regency_id.clone(),
            record.district_id.clone(),
            record.village_id.clone(),
        ];
        let mut tickets = vec![self.load_root()];
        for level in RegionLevel::ALL {
            let state = &mut self.levels[level.index()];
            state.selected = ids[level.index()].clone();
            if let Some(parent) = level.parent()
                && let Some(parent_id) = ids[parent.index()].clone()
            {
                tickets.push(state.begin(level, Some(parent_id)));
            } else if level != RegionLevel::Province {
                state.reset();
                state.selected = ids[level.index()].clone();
            }
        }
        tickets
    }

    /// Applies a finished fetch unless a newer request superseded it.
    pub fn apply_response(&mut self, response: LookupResponse) -> LookupApplied {
        let LookupResponse { ticket, result } = response;
        let state = &mut self.levels[ticket.level.index()];
        if state.generation != ticket.generation || state.parent_id != ticket.parent_id {
            debug!(
                level = %ticket.level,
                parent = ?ticket.parent_id,
                generation = ticket.generation,
                current = state.generation,
                "discarding stale lookup response"
            );
            return LookupApplied::Stale;
        }
        match result {
            Ok(options) => {
                let count = options.len();
                state.options = options;
                state.status = LookupStatus::Loaded;
                LookupApplied::Loaded(count)
            }
            Err(LookupFailure(message)) => {
                warn!(level = %ticket.level, %message, "region lookup failed");
                state.options.clear();
                state.status = LookupStatus::Error;
                LookupApplied::Failed
            }
        }
    }
}
