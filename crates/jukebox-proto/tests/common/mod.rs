pub mod mpd_server;
