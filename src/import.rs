use std::path::Path;

use anyhow::{anyhow, Result};
use event_file_reader::EventFileReader as Reader;
use log::debug;

use crate::event::Event;

/// Read all events from a file in any format supported by `event_file_reader`
pub fn import(filename: &Path) -> Result<impl Iterator<Item = Result<Event>> + '_> {
    debug!("Importing events from {filename:?}");
    let reader = Reader::new(filename)
        .map_err(|err| anyhow!("Failed to open {filename:?}: {err}"))?;
    let events = reader.map(move |event| {
        event
            .map(Event::from)
            .map_err(|err| anyhow!("Error reading event from {filename:?}: {err}"))
    });
    Ok(events)
}
