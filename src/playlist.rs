use crate::error::{PlayerError, Result};
use crate::media::Media;

/// Ordered list of media the player walks through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playlist {
    items: Vec<Media>,
}

impl Playlist {
    pub fn new(items: Vec<Media>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Media] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Media> {
        self.items.get(index)
    }

    /// Position of the first entry equal to `media`.
    pub fn index_of(&self, media: &Media) -> Option<usize> {
        self.items.iter().position(|item| item == media)
    }

    pub fn add(&mut self, media: Media) {
        self.items.push(media);
    }

    /// Inserts before `index`; `index == len` appends.
    pub fn insert(&mut self, index: usize, media: Media) -> Result<()> {
        if index > self.items.len() {
            return Err(self.out_of_range(index));
        }
        self.items.insert(index, media);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Media> {
        if index >= self.items.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.items.remove(index))
    }

    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.items.len();
        if from >= len {
            return Err(self.out_of_range(from));
        }
        if to >= len {
            return Err(self.out_of_range(to));
        }
        let media = self.items.remove(from);
        self.items.insert(to, media);
        Ok(())
    }

    fn out_of_range(&self, index: usize) -> PlayerError {
        PlayerError::IndexOutOfRange {
            index,
            len: self.items.len(),
        }
    }
}

impl From<Vec<Media>> for Playlist {
    fn from(items: Vec<Media>) -> Self {
        Self::new(items)
    }
}
