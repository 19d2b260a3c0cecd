#![allow(dead_code)]

pub mod recording_channel;
pub mod scripted_feed;
pub mod temp_db;
