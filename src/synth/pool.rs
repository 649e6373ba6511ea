//! Fixed-capacity voice pool.
//!
//! Voices live in one arena allocated up front. Two index-linked lists
//! partition the arena: the free list and the play list. Allocation pops
//! the free head and appends to the play tail; release does the reverse.
//! Both are O(1) and never allocate.
//!
//! A `notes` table maps each MIDI note to the voice currently bound to it.
//! A voice stays on the play list after being unbound (stolen notes keep
//! draining their fast release), so "bound" is always checked against the
//! table rather than the voice's own `note`.

use crate::{synth::voice::Voice, MAX_NOTES, MAX_VOICES};

const NIL: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(usize);

impl VoiceId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: usize,
    next: usize,
    playing: bool,
}

#[derive(Debug, Clone, Copy)]
struct List {
    head: usize,
    tail: usize,
    len: usize,
}

impl List {
    const EMPTY: Self = Self {
        head: NIL,
        tail: NIL,
        len: 0,
    };
}

pub struct VoicePool {
    voices: Vec<Voice>,
    links: [Link; MAX_VOICES],
    free: List,
    play: List,
    notes: [Option<VoiceId>; MAX_NOTES],
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new()
    }
}

impl VoicePool {
    pub fn new() -> Self {
        let voices = (0..MAX_VOICES).map(|i| Voice::new(i as u64 + 1)).collect();
        let mut pool = Self {
            voices,
            links: [Link {
                prev: NIL,
                next: NIL,
                playing: false,
            }; MAX_VOICES],
            free: List::EMPTY,
            play: List::EMPTY,
            notes: [None; MAX_NOTES],
        };
        for i in 0..MAX_VOICES {
            pool.push_back(false, i);
        }
        pool
    }

    pub fn capacity(&self) -> usize {
        MAX_VOICES
    }

    pub fn active_count(&self) -> usize {
        self.play.len
    }

    pub fn free_count(&self) -> usize {
        self.free.len
    }

    /// Move the free head onto the play list, or `None` when every voice
    /// is busy.
    pub fn allocate(&mut self) -> Option<VoiceId> {
        let index = self.free.head;
        if index == NIL {
            return None;
        }
        self.unlink(false, index);
        self.push_back(true, index);
        Some(VoiceId(index))
    }

    /// Return a voice to the free list, clearing its note-table entry if
    /// the table still points at it.
    pub fn release(&mut self, id: VoiceId) {
        let index = id.0;
        if index >= MAX_VOICES || !self.links[index].playing {
            return;
        }
        if let Some(note) = self.voices[index].note {
            let slot = &mut self.notes[note as usize & 0x7f];
            if *slot == Some(id) {
                *slot = None;
            }
        }
        self.voices[index].clear();
        self.unlink(true, index);
        self.push_back(false, index);
    }

    /// Release every playing voice and clear the note table.
    pub fn release_all(&mut self) {
        while self.play.head != NIL {
            self.release(VoiceId(self.play.head));
        }
        self.notes = [None; MAX_NOTES];
    }

    pub fn voice(&self, id: VoiceId) -> &Voice {
        &self.voices[id.0]
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> &mut Voice {
        &mut self.voices[id.0]
    }

    pub fn is_playing(&self, id: VoiceId) -> bool {
        self.links[id.0].playing
    }

    pub fn note_voice(&self, note: u8) -> Option<VoiceId> {
        self.notes[note as usize & 0x7f]
    }

    pub fn bind_note(&mut self, note: u8, id: VoiceId) {
        let note = note & 0x7f;
        self.voices[id.0].note = Some(note);
        self.notes[note as usize] = Some(id);
    }

    /// Detach a note from its voice; the voice keeps playing.
    pub fn unbind_note(&mut self, note: u8) -> Option<VoiceId> {
        self.notes[note as usize & 0x7f].take()
    }

    /// Whether `id` is the voice the note table currently maps its note to.
    pub fn is_bound(&self, id: VoiceId) -> bool {
        self.voices[id.0]
            .note
            .is_some_and(|note| self.notes[note as usize] == Some(id))
    }

    pub fn first_playing(&self) -> Option<VoiceId> {
        (self.play.head != NIL).then_some(VoiceId(self.play.head))
    }

    pub fn next_playing(&self, id: VoiceId) -> Option<VoiceId> {
        let next = self.links[id.0].next;
        (self.links[id.0].playing && next != NIL).then_some(VoiceId(next))
    }

    pub fn iter_playing(&self) -> PlayingIter<'_> {
        PlayingIter {
            pool: self,
            cursor: self.first_playing(),
        }
    }

    fn list_mut(&mut self, playing: bool) -> &mut List {
        if playing {
            &mut self.play
        } else {
            &mut self.free
        }
    }

    fn push_back(&mut self, playing: bool, index: usize) {
        let tail = self.list_mut(playing).tail;
        self.links[index] = Link {
            prev: tail,
            next: NIL,
            playing,
        };
        if tail != NIL {
            self.links[tail].next = index;
        }
        let list = self.list_mut(playing);
        if list.head == NIL {
            list.head = index;
        }
        list.tail = index;
        list.len += 1;
    }

    fn unlink(&mut self, playing: bool, index: usize) {
        let Link { prev, next, .. } = self.links[index];
        if prev != NIL {
            self.links[prev].next = next;
        }
        if next != NIL {
            self.links[next].prev = prev;
        }
        let list = self.list_mut(playing);
        if list.head == index {
            list.head = next;
        }
        if list.tail == index {
            list.tail = prev;
        }
        list.len -= 1;
        self.links[index].prev = NIL;
        self.links[index].next = NIL;
    }
}

pub struct PlayingIter<'a> {
    pool: &'a VoicePool,
    cursor: Option<VoiceId>,
}

impl Iterator for PlayingIter<'_> {
    type Item = VoiceId;

    fn next(&mut self) -> Option<VoiceId> {
        let id = self.cursor?;
        self.cursor = self.pool.next_playing(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partitioned(pool: &VoicePool) {
        assert_eq!(
            pool.active_count() + pool.free_count(),
            MAX_VOICES,
            "free and play lists must cover the pool"
        );
        assert_eq!(pool.iter_playing().count(), pool.active_count());
    }

    #[test]
    fn allocates_until_exhausted() {
        let mut pool = VoicePool::new();
        let mut ids = Vec::new();
        for _ in 0..MAX_VOICES {
            ids.push(pool.allocate().expect("pool should have a free voice"));
            assert_partitioned(&pool);
        }
        assert_eq!(pool.allocate(), None, "no stealing when full");
        assert_eq!(pool.free_count(), 0);

        pool.release(ids[7]);
        assert_partitioned(&pool);
        assert_eq!(pool.allocate(), Some(ids[7]));
    }

    #[test]
    fn play_order_is_allocation_order() {
        let mut pool = VoicePool::new();
        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();
        let c = pool.allocate().unwrap();
        pool.release(b);

        let order: Vec<_> = pool.iter_playing().collect();
        assert_eq!(order, vec![a, c]);
    }

    #[test]
    fn release_clears_bound_note() {
        let mut pool = VoicePool::new();
        let id = pool.allocate().unwrap();
        pool.bind_note(60, id);
        assert_eq!(pool.note_voice(60), Some(id));
        assert!(pool.is_bound(id));

        pool.release(id);
        assert_eq!(pool.note_voice(60), None);
        assert_eq!(pool.voice(id).note, None);
        assert!(!pool.is_playing(id));
    }

    #[test]
    fn draining_voice_does_not_clear_newer_binding() {
        let mut pool = VoicePool::new();
        let old = pool.allocate().unwrap();
        pool.bind_note(60, old);

        pool.unbind_note(60);
        assert!(!pool.is_bound(old));
        let new = pool.allocate().unwrap();
        pool.bind_note(60, new);

        pool.release(old);
        assert_eq!(pool.note_voice(60), Some(new));
        assert_eq!(pool.voice(new).note, Some(60));
    }

    #[test]
    fn double_release_is_harmless() {
        let mut pool = VoicePool::new();
        let id = pool.allocate().unwrap();
        pool.release(id);
        pool.release(id);
        assert_partitioned(&pool);
        assert_eq!(pool.free_count(), MAX_VOICES);
    }

    #[test]
    fn release_all_empties_play_list() {
        let mut pool = VoicePool::new();
        for note in 40..50 {
            let id = pool.allocate().unwrap();
            pool.bind_note(note, id);
        }
        pool.release_all();
        assert_eq!(pool.active_count(), 0);
        assert!((40..50).all(|n| pool.note_voice(n).is_none()));
        assert_partitioned(&pool);
    }
}
