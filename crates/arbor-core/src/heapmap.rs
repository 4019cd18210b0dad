use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy)]
struct Entry<S> {
    handle: usize,
    score: S,
}

/// Min-heap on score `S` over a dense value array with stable handles, plus
/// a key -> handle map.
///
/// A handle is the value's slot in the dense arrays; it stays valid until the
/// entry it names is removed. Invariant upheld by every mutation: for every
/// live handle `h`, `heap[pos[h]].handle == h` and `heap` is a min-heap on
/// the scores.
#[derive(Debug, Clone)]
pub struct HeapIndexMap<K, S, V> {
    keys: Vec<K>,
    vals: Vec<V>,
    pos: Vec<usize>,
    heap: Vec<Entry<S>>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone, S: PartialOrd + Copy, V> Default for HeapIndexMap<K, S, V> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            vals: Vec::new(),
            pos: Vec::new(),
            heap: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, S: PartialOrd + Copy, V> HeapIndexMap<K, S, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, n: usize) {
        self.keys.reserve(n);
        self.vals.reserve(n);
        self.pos.reserve(n);
        self.heap.reserve(n);
        self.index.reserve(n);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Inserts `key` with value `val` at priority `score`; an existing key
    /// has its value replaced and its priority adjusted in place.
    pub fn push(&mut self, key: K, val: V, score: S) {
        if let Some(&h) = self.index.get(&key) {
            self.vals[h] = val;
            self.update(h, score);
            return;
        }
        let h = self.keys.len();
        self.index.insert(key.clone(), h);
        self.keys.push(key);
        self.vals.push(val);
        self.pos.push(self.heap.len());
        self.heap.push(Entry { handle: h, score });
        self.sift_up(self.heap.len() - 1);
    }

    pub fn get(&self, key: &K) -> Option<(usize, &V)> {
        let h = *self.index.get(key)?;
        Some((h, &self.vals[h]))
    }

    pub fn get_mut(&mut self, key: &K) -> Option<(usize, &mut V)> {
        let h = *self.index.get(key)?;
        Some((h, &mut self.vals[h]))
    }

    pub fn key(&self, handle: usize) -> &K {
        &self.keys[handle]
    }

    pub fn val(&self, handle: usize) -> &V {
        &self.vals[handle]
    }

    pub fn val_mut(&mut self, handle: usize) -> &mut V {
        &mut self.vals[handle]
    }

    /// Re-prioritizes the entry behind `handle`. Sifts down first, then up,
    /// covering both directions in one call.
    pub fn update(&mut self, handle: usize, score: S) {
        let p = self.pos[handle];
        self.heap[p].score = score;
        self.fix(p);
    }

    /// Removes the entry behind `handle`, returning its key and value.
    pub fn remove(&mut self, handle: usize) -> (K, V) {
        self.heap_remove(self.pos[handle]);
        let key = self.keys.swap_remove(handle);
        let val = self.vals.swap_remove(handle);
        self.pos.swap_remove(handle);
        self.index.remove(&key);
        if handle < self.keys.len() {
            // The former last slot moved into `handle`; re-point its heap
            // entry and index.
            self.heap[self.pos[handle]].handle = handle;
            self.index.insert(self.keys[handle].clone(), handle);
        }
        (key, val)
    }

    /// The minimum-score entry as `(handle, key, value, score)`.
    pub fn top(&self) -> Option<(usize, &K, &V, S)> {
        let e = self.heap.first()?;
        Some((e.handle, &self.keys[e.handle], &self.vals[e.handle], e.score))
    }

    pub fn pop(&mut self) -> Option<(K, V, S)> {
        let e = *self.heap.first()?;
        let (k, v) = self.remove(e.handle);
        Some((k, v, e.score))
    }

    /// Keeps only the entries whose value satisfies `pred`: compacts the
    /// storage, then re-heapifies. Handles are NOT stable across a filter.
    pub fn filter(&mut self, mut pred: impl FnMut(&V) -> bool) {
        let n = self.keys.len();
        let mut scores = Vec::with_capacity(n);
        for h in 0..n {
            scores.push(self.heap[self.pos[h]].score);
        }
        let old_keys = std::mem::take(&mut self.keys);
        let old_vals = std::mem::take(&mut self.vals);
        self.pos.clear();
        self.heap.clear();
        self.index.clear();
        for ((key, val), score) in old_keys.into_iter().zip(old_vals).zip(scores) {
            if !pred(&val) {
                continue;
            }
            let h = self.keys.len();
            self.index.insert(key.clone(), h);
            self.keys.push(key);
            self.vals.push(val);
            self.pos.push(h);
            self.heap.push(Entry { handle: h, score });
        }
        let len = self.heap.len();
        for i in (0..len / 2).rev() {
            self.sift_down(i, len);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.keys.iter().zip(self.vals.iter())
    }

    /// Validates the heap property and the handle <-> position mapping.
    /// Cheap enough for tests, not meant for hot paths.
    pub fn check(&self) -> bool {
        let n = self.keys.len();
        if self.vals.len() != n || self.pos.len() != n || self.heap.len() != n {
            return false;
        }
        for h in 0..n {
            if self.pos[h] >= n || self.heap[self.pos[h]].handle != h {
                return false;
            }
        }
        for i in 1..n {
            let parent = (i - 1) / 2;
            if self.heap[parent].score > self.heap[i].score {
                return false;
            }
        }
        self.index.len() == n
            && self
                .index
                .iter()
                .all(|(k, &h)| h < n && self.keys[h] == *k)
    }

    fn fix(&mut self, i: usize) {
        let len = self.heap.len();
        if self.sift_down(i, len) == i {
            self.sift_up(i);
        }
    }

    fn sift_up(&mut self, mut j: usize) -> usize {
        while j > 0 {
            let i = (j - 1) / 2;
            if self.heap[i].score <= self.heap[j].score {
                break;
            }
            self.pos[self.heap[i].handle] = j;
            self.pos[self.heap[j].handle] = i;
            self.heap.swap(i, j);
            j = i;
        }
        j
    }

    fn sift_down(&mut self, i0: usize, n: usize) -> usize {
        let mut i = i0;
        loop {
            let left = 2 * i + 1;
            if left >= n {
                break;
            }
            let mut j = left;
            let right = left + 1;
            if right < n && self.heap[right].score <= self.heap[j].score {
                j = right;
            }
            if self.heap[i].score <= self.heap[j].score {
                break;
            }
            self.pos[self.heap[i].handle] = j;
            self.pos[self.heap[j].handle] = i;
            self.heap.swap(i, j);
            i = j;
        }
        i
    }

    fn heap_remove(&mut self, p: usize) {
        let n = self.heap.len() - 1;
        if p != n {
            self.pos[self.heap[n].handle] = p;
            self.heap.swap(p, n);
            self.heap.truncate(n);
            if self.sift_down(p, n) == p {
                self.sift_up(p);
            }
        } else {
            self.heap.truncate(n);
        }
    }
}
