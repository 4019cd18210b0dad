//! Hierarchical tag identity and ancestor-closure membership.
//!
//! Tags are dotted paths (`state.combat.melee`); compiling one interns every
//! dot-prefix, so holding a leaf tag implies holding its ancestors.

use std::collections::{HashMap, HashSet};

use crate::arraymap::ArrayMap;

pub type TagId = i16;

/// Interner for dotted tag strings with parent links.
#[derive(Debug, Default)]
pub struct TagDb {
    by_name: HashMap<String, TagId>,
    names: Vec<String>,
    parents: Vec<Option<TagId>>,
}

impl TagDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `path` and every dot-prefix of it, recording each segment's
    /// parent (its longest proper prefix). Returns the id of the full path.
    pub fn compile(&mut self, path: &str) -> TagId {
        let mut parent: Option<TagId> = None;
        let mut end = 0;
        loop {
            let next_dot = path[end..].find('.').map(|i| end + i);
            let prefix = &path[..next_dot.unwrap_or(path.len())];
            let id = match self.by_name.get(prefix) {
                Some(&id) => id,
                None => {
                    let id = self.names.len() as TagId;
                    self.by_name.insert(prefix.to_owned(), id);
                    self.names.push(prefix.to_owned());
                    self.parents.push(parent);
                    id
                }
            };
            match next_dot {
                Some(dot) => {
                    parent = Some(id);
                    end = dot + 1;
                }
                None => return id,
            }
        }
    }

    pub fn parent(&self, id: TagId) -> Option<TagId> {
        self.parents.get(id as usize).copied().flatten()
    }

    pub fn is_ancestor(&self, ancestor: TagId, mut id: TagId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.parent(id) {
                Some(p) => id = p,
                None => return false,
            }
        }
    }

    pub fn name(&self, id: TagId) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }
}

/// All/none/some tag filter.
#[derive(Debug, Default, Clone)]
pub struct TagQuery {
    pub all: Vec<TagId>,
    pub none: Vec<TagId>,
    pub some: Vec<TagId>,
}

/// Reference-counted tag membership with an ancestor-closure cache.
///
/// Adding `a.b.c` makes `a.b` and `a` present as well; the closure is
/// rebuilt only when a count transitions between zero and non-zero.
#[derive(Debug, Default)]
pub struct TagSet {
    counts: ArrayMap<TagId, u32>,
    cache: HashSet<TagId>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, db: &TagDb, tag: TagId) {
        if let Some((_, count)) = self.counts.get_mut(&tag) {
            *count += 1;
            return;
        }
        self.counts.put(tag, 1);
        self.rebuild_cache(db);
    }

    pub fn remove(&mut self, db: &TagDb, tag: TagId) {
        if let Some((i, count)) = self.counts.get_mut(&tag) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(i);
                self.rebuild_cache(db);
            }
        }
    }

    pub fn has(&self, tag: TagId) -> bool {
        self.cache.contains(&tag)
    }

    pub fn matches(&self, query: &TagQuery) -> bool {
        if query.all.iter().any(|&t| !self.has(t)) {
            return false;
        }
        if query.none.iter().any(|&t| self.has(t)) {
            return false;
        }
        if !query.some.is_empty() {
            return query.some.iter().any(|&t| self.has(t));
        }
        true
    }

    fn rebuild_cache(&mut self, db: &TagDb) {
        self.cache.clear();
        for (&tag, _) in self.counts.iter() {
            let mut cur = Some(tag);
            while let Some(t) = cur {
                self.cache.insert(t);
                cur = db.parent(t);
            }
        }
    }
}
