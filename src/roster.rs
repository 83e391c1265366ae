use crate::ParticipantId;

/// Participants split into those taking part in the schedule and those sitting out.
///
/// Both lists are kept sorted and a name lives in at most one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    included: Vec<ParticipantId>,
    excluded: Vec<ParticipantId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
    Blank,
}

/// One line of roster input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterCommand {
    Add(String),
    Delete(String),
    Exclude(String),
    Include(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Added,
    Duplicate,
    Deleted,
    Moved,
    NotFound,
    Ignored,
}

impl RosterCommand {
    /// Parse a line. Blank lines and `#` comments yield `None`.
    ///
    /// `delete:NAME`, `exclude:NAME` and `include:NAME` are recognised regardless of
    /// case; anything else is a name to add.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        if let Some((prefix, rest)) = line.split_once(':') {
            let name = rest.trim().to_string();
            match prefix.trim().to_lowercase().as_str() {
                "delete" => return Some(RosterCommand::Delete(name)),
                "exclude" => return Some(RosterCommand::Exclude(name)),
                "include" => return Some(RosterCommand::Include(name)),
                _ => {}
            }
        }
        Some(RosterCommand::Add(line.to_string()))
    }
}

fn insert_sorted(list: &mut Vec<ParticipantId>, name: String) {
    if let Err(pos) = list.binary_search(&name) {
        list.insert(pos, name);
    }
}

fn remove_from(list: &mut Vec<ParticipantId>, name: &str) -> bool {
    match list.iter().position(|x| x == name) {
        Some(pos) => {
            list.remove(pos);
            true
        }
        None => false,
    }
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include every non-blank name once, in sorted order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roster = Roster::new();
        for name in names {
            roster.add(name.as_ref());
        }
        roster
    }

    pub fn add(&mut self, name: &str) -> AddOutcome {
        let name = name.trim();
        if name.is_empty() {
            return AddOutcome::Blank;
        }
        if self.contains(name) {
            return AddOutcome::Duplicate;
        }
        insert_sorted(&mut self.included, name.to_string());
        AddOutcome::Added
    }

    /// Move `name` to the excluded list. Returns false if it was not included.
    pub fn exclude(&mut self, name: &str) -> bool {
        if remove_from(&mut self.included, name) {
            insert_sorted(&mut self.excluded, name.to_string());
            true
        } else {
            false
        }
    }

    /// Move `name` back to the included list. Returns false if it was not excluded.
    pub fn include(&mut self, name: &str) -> bool {
        if remove_from(&mut self.excluded, name) {
            insert_sorted(&mut self.included, name.to_string());
            true
        } else {
            false
        }
    }

    /// Remove `name` from whichever list holds it.
    pub fn delete(&mut self, name: &str) -> bool {
        remove_from(&mut self.included, name) || remove_from(&mut self.excluded, name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.included.iter().any(|x| x == name) || self.excluded.iter().any(|x| x == name)
    }

    pub fn apply(&mut self, command: &RosterCommand) -> CommandOutcome {
        match command {
            RosterCommand::Add(name) => match self.add(name) {
                AddOutcome::Added => CommandOutcome::Added,
                AddOutcome::Duplicate => CommandOutcome::Duplicate,
                AddOutcome::Blank => CommandOutcome::Ignored,
            },
            RosterCommand::Delete(name) => found(self.delete(name), CommandOutcome::Deleted),
            RosterCommand::Exclude(name) => found(self.exclude(name), CommandOutcome::Moved),
            RosterCommand::Include(name) => found(self.include(name), CommandOutcome::Moved),
        }
    }

    /// The participants handed to the schedule builder.
    pub fn participants(&self) -> &[ParticipantId] {
        &self.included
    }

    pub fn excluded(&self) -> &[ParticipantId] {
        &self.excluded
    }

    pub fn len(&self) -> usize {
        self.included.len()
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }
}

fn found(ok: bool, outcome: CommandOutcome) -> CommandOutcome {
    if ok {
        outcome
    } else {
        CommandOutcome::NotFound
    }
}
