//! Multi-file aggregation per logical bus channel
//!
//! A test rig pairs each channel with an ordered stack of database file
//! revisions; later files overwrite earlier ones on message-id collision.
//! Per-file failures are logged and skipped so one bad or missing file never
//! takes down a multi-channel load — downstream decoding simply sees fewer
//! sources for that channel.

use crate::model::{Database, Message, Signal};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Merged view of all database files configured for one channel
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelIndex {
    /// Merged messages, last file wins on id collision
    messages: HashMap<u32, Message>,
    /// Signal name -> signal metadata, derived from the merged messages
    signals: HashMap<String, Signal>,
    /// Full paths of the files that actually loaded, in load order
    loaded_paths: Vec<PathBuf>,
}

impl ChannelIndex {
    /// Load and merge the listed files in declared order.
    fn load(channel: &str, root: &Path, files: &[PathBuf]) -> Self {
        let mut index = ChannelIndex::default();
        if files.is_empty() {
            log::warn!("no database files configured for channel {}", channel);
            return index;
        }
        for file in files {
            let full_path = root.join(file);
            match Database::load(&full_path) {
                Ok(database) => {
                    for message in database.messages() {
                        index.messages.insert(message.id_dec, message.clone());
                    }
                    index.loaded_paths.push(full_path);
                }
                Err(err) => {
                    log::warn!("channel {}: skipping file: {}", channel, err);
                }
            }
        }
        for message in index.messages.values() {
            for signal in message.signals.values() {
                index.signals.insert(signal.name.clone(), signal.clone());
            }
        }
        index
    }

    /// Look up a merged message by numeric id
    pub fn message(&self, id: u32) -> Option<&Message> {
        self.messages.get(&id)
    }

    /// Look up a signal by name across all merged messages
    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }

    /// All merged messages, in no particular order
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    /// All indexed signal names, in no particular order
    pub fn signal_names(&self) -> impl Iterator<Item = &str> {
        self.signals.keys().map(String::as_str)
    }

    /// Files that actually loaded, in load order
    pub fn loaded_paths(&self) -> &[PathBuf] {
        &self.loaded_paths
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Channel key -> merged database index
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelMatrix {
    channels: HashMap<String, ChannelIndex>,
}

impl ChannelMatrix {
    /// Build the matrix from a channel -> file list mapping.
    ///
    /// Each parse is a pure function of its file bytes, so channels load in
    /// parallel; within one channel, files load in declared order to keep
    /// last-file-wins merges deterministic.
    pub fn build(root: &Path, channel_files: &BTreeMap<String, Vec<PathBuf>>) -> Self {
        let channels = channel_files
            .par_iter()
            .map(|(channel, files)| {
                let index = ChannelIndex::load(channel, root, files);
                log::info!(
                    "channel {}: {} files, {} messages, {} signals",
                    channel,
                    index.loaded_paths().len(),
                    index.message_count(),
                    index.signal_count()
                );
                (channel.clone(), index)
            })
            .collect();
        Self { channels }
    }

    /// Index for one channel key
    pub fn channel(&self, key: &str) -> Option<&ChannelIndex> {
        self.channels.get(key)
    }

    /// All channels, keyed by caller-defined channel name
    pub fn channels(&self) -> impl Iterator<Item = (&str, &ChannelIndex)> {
        self.channels.iter().map(|(key, index)| (key.as_str(), index))
    }

    /// Channel keys that define the given signal name, sorted for
    /// deterministic reporting
    pub fn owners(&self, signal_name: &str) -> Vec<&str> {
        let mut owners: Vec<&str> = self
            .channels
            .iter()
            .filter(|(_, index)| index.signal(signal_name).is_some())
            .map(|(key, _)| key.as_str())
            .collect();
        owners.sort_unstable();
        owners
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
