//! DOR groups: user-defined buckets that consolidate line items for the
//! printed report.
//!
//! Membership is a single map from item id to group, so an item can never
//! sit in two groups at once. Group totals and the available pool are
//! derived from that map on every read instead of being stored.

#[cfg(test)]
mod props;

use crate::aggregate::ItemMap;
use crate::error::PtrabError;
use crate::model::LineItem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of a group and its items, in the order they were moved in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DorGroup {
    pub id: GroupId,
    pub name: String,
    pub items: Vec<LineItem>,
    /// Always the sum of `items[..].value`.
    pub total: Decimal,
}

/// Emitted after every successful board mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    GroupCreated {
        group: GroupId,
        name: String,
    },
    ItemMoved {
        item_id: String,
        from: Option<GroupId>,
        to: GroupId,
    },
    ItemReturned {
        item_id: String,
        group: GroupId,
    },
    GroupDeleted {
        group: GroupId,
        released: usize,
    },
    ItemsReloaded {
        dropped: usize,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardOptions {
    /// Reject groups whose items span more than one sub-budget-item.
    pub single_subitem_per_group: bool,
}

/// A named group and the item ids to put in it, as read from a plan file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPlan {
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone)]
struct GroupEntry {
    id: GroupId,
    name: String,
}

#[derive(Debug, Clone, Copy)]
struct Membership {
    group: GroupId,
    seq: u64,
}

type Observer = Box<dyn FnMut(&BoardEvent)>;

pub struct DorBoard {
    items: ItemMap,
    groups: Vec<GroupEntry>,
    membership: BTreeMap<String, Membership>,
    next_group: u32,
    next_seq: u64,
    options: BoardOptions,
    observer: Option<Observer>,
}

impl fmt::Debug for DorBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DorBoard")
            .field("items", &self.items.len())
            .field("groups", &self.groups)
            .field("membership", &self.membership)
            .field("options", &self.options)
            .finish()
    }
}

impl DorBoard {
    pub fn new(items: ItemMap) -> DorBoard {
        DorBoard::with_options(items, BoardOptions::default())
    }

    pub fn with_options(items: ItemMap, options: BoardOptions) -> DorBoard {
        DorBoard {
            items,
            groups: Vec::new(),
            membership: BTreeMap::new(),
            next_group: 1,
            next_seq: 0,
            options,
            observer: None,
        }
    }

    /// Register a callback run after each completed step.
    pub fn on_step_complete(mut self, observer: impl FnMut(&BoardEvent) + 'static) -> DorBoard {
        self.observer = Some(Box::new(observer));
        self
    }

    fn notify(&mut self, event: BoardEvent) {
        debug!(?event, "board step complete");
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }

    pub fn items(&self) -> &ItemMap {
        &self.items
    }

    pub fn options(&self) -> BoardOptions {
        self.options
    }

    fn entry(&self, group: GroupId) -> Result<&GroupEntry, PtrabError> {
        self.groups
            .iter()
            .find(|g| g.id == group)
            .ok_or(PtrabError::UnknownGroup(group))
    }

    /// Trimmed, uppercased group name, rejected when blank or already taken.
    fn group_name(&self, name: &str) -> Result<String, PtrabError> {
        let name = name.trim().to_uppercase();
        if name.is_empty() {
            return Err(PtrabError::Validation("group name must not be blank".into()));
        }
        if self.groups.iter().any(|g| g.name == name) {
            return Err(PtrabError::Validation(format!(
                "a group named '{}' already exists",
                name
            )));
        }
        Ok(name)
    }

    /// Create an empty group. The name is trimmed and uppercased.
    pub fn create_group(&mut self, name: &str) -> Result<GroupId, PtrabError> {
        let name = self.group_name(name)?;

        let id = GroupId(self.next_group);
        self.next_group += 1;
        self.groups.push(GroupEntry {
            id,
            name: name.clone(),
        });
        self.notify(BoardEvent::GroupCreated { group: id, name });
        Ok(id)
    }

    /// Put an item into `target`, taking it out of any group it was in.
    ///
    /// Moving an item into the group that already holds it is a no-op.
    pub fn move_item(&mut self, item_id: &str, target: GroupId) -> Result<(), PtrabError> {
        let target_name = self.entry(target)?.name.clone();
        let item = self
            .items
            .get(item_id)
            .ok_or_else(|| PtrabError::UnknownItem(item_id.to_string()))?;

        let from = self.membership.get(item_id).map(|m| m.group);
        if from == Some(target) {
            return Ok(());
        }

        if self.options.single_subitem_per_group {
            if let Some(ref subitem) = item.subitem {
                let conflict = self
                    .member_ids(target)
                    .filter_map(|id| self.items.get(id))
                    .filter_map(|other| other.subitem.as_deref())
                    .find(|other| *other != subitem.as_str());
                if let Some(other) = conflict {
                    return Err(PtrabError::BusinessRule(format!(
                        "'{}' belongs to subitem {} but group {} already holds subitem {}; \
                         a group may only span one subitem",
                        item.description, subitem, target_name, other
                    )));
                }
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.membership.insert(
            item_id.to_string(),
            Membership {
                group: target,
                seq,
            },
        );
        self.notify(BoardEvent::ItemMoved {
            item_id: item_id.to_string(),
            from,
            to: target,
        });
        Ok(())
    }

    /// Take an item out of `group`, returning it to the available pool.
    pub fn return_item(&mut self, group: GroupId, item_id: &str) -> Result<(), PtrabError> {
        let name = self.entry(group)?.name.clone();
        match self.membership.get(item_id) {
            Some(m) if m.group == group => {
                self.membership.remove(item_id);
                self.notify(BoardEvent::ItemReturned {
                    item_id: item_id.to_string(),
                    group,
                });
                Ok(())
            }
            _ => Err(PtrabError::Validation(format!(
                "item '{}' is not in group {}",
                item_id, name
            ))),
        }
    }

    /// Remove a group. Its items go back to the available pool.
    pub fn delete_group(&mut self, group: GroupId) -> Result<DorGroup, PtrabError> {
        let snapshot = self.snapshot(self.entry(group)?);
        self.groups.retain(|g| g.id != group);
        self.membership.retain(|_, m| m.group != group);
        self.notify(BoardEvent::GroupDeleted {
            group,
            released: snapshot.items.len(),
        });
        Ok(snapshot)
    }

    /// Replace the item map after the source tables were reloaded.
    ///
    /// Items that no longer exist leave their groups; the rest keep their
    /// place and pick up their new values.
    pub fn reload(&mut self, items: ItemMap) {
        let before = self.membership.len();
        self.membership.retain(|id, _| items.contains_key(id));
        let dropped = before - self.membership.len();
        self.items = items;
        self.notify(BoardEvent::ItemsReloaded { dropped });
    }

    /// Create the groups of a plan and move their items in.
    ///
    /// The whole plan is checked first; on error the board is left untouched.
    pub fn apply_plan(&mut self, plan: &[GroupPlan]) -> Result<Vec<GroupId>, PtrabError> {
        self.check_plan(plan)?;
        let mut ids = Vec::with_capacity(plan.len());
        for p in plan {
            let id = self.create_group(&p.name)?;
            for item_id in &p.items {
                self.move_item(item_id, id)?;
            }
            ids.push(id);
        }
        Ok(ids)
    }

    fn check_plan(&self, plan: &[GroupPlan]) -> Result<(), PtrabError> {
        let mut names = HashSet::new();
        let mut planned: HashMap<&str, &str> = HashMap::new();
        for p in plan {
            let name = self.group_name(&p.name)?;
            if !names.insert(name.clone()) {
                return Err(PtrabError::Validation(format!(
                    "group '{}' appears twice in the plan",
                    name
                )));
            }

            let mut subitem: Option<&str> = None;
            for item_id in &p.items {
                let item = self
                    .items
                    .get(item_id)
                    .ok_or_else(|| PtrabError::UnknownItem(item_id.clone()))?;
                if let Some(other) = planned.insert(item_id.as_str(), p.name.as_str()) {
                    return Err(PtrabError::Validation(format!(
                        "item '{}' is planned for both '{}' and '{}'",
                        item_id, other, p.name
                    )));
                }

                if !self.options.single_subitem_per_group {
                    continue;
                }
                match (subitem, item.subitem.as_deref()) {
                    (Some(first), Some(this)) if first != this => {
                        return Err(PtrabError::BusinessRule(format!(
                            "group {} mixes subitems {} and {}; \
                             a group may only span one subitem",
                            name, first, this
                        )));
                    }
                    (None, Some(this)) => subitem = Some(this),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn member_ids(&self, group: GroupId) -> impl Iterator<Item = &String> + '_ {
        self.membership
            .iter()
            .filter(move |(_, m)| m.group == group)
            .map(|(id, _)| id)
    }

    fn snapshot(&self, entry: &GroupEntry) -> DorGroup {
        let mut members: Vec<(&String, u64)> = self
            .membership
            .iter()
            .filter(|(_, m)| m.group == entry.id)
            .map(|(id, m)| (id, m.seq))
            .collect();
        members.sort_by_key(|(_, seq)| *seq);

        let items: Vec<LineItem> = members
            .into_iter()
            .filter_map(|(id, _)| self.items.get(id).cloned())
            .collect();
        let total = items.iter().map(|i| i.value).sum();
        DorGroup {
            id: entry.id,
            name: entry.name.clone(),
            items,
            total,
        }
    }

    pub fn group(&self, group: GroupId) -> Option<DorGroup> {
        self.groups
            .iter()
            .find(|g| g.id == group)
            .map(|g| self.snapshot(g))
    }

    /// All groups in creation order.
    pub fn groups(&self) -> Vec<DorGroup> {
        self.groups.iter().map(|g| self.snapshot(g)).collect()
    }

    pub fn group_of(&self, item_id: &str) -> Option<GroupId> {
        self.membership.get(item_id).map(|m| m.group)
    }

    /// Items not in any group.
    pub fn available(&self) -> Vec<&LineItem> {
        self.items
            .values()
            .filter(|i| !self.membership.contains_key(&i.id))
            .collect()
    }

    pub fn available_total(&self) -> Decimal {
        self.available().iter().map(|i| i.value).sum()
    }
}
