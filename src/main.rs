use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{value_parser, Arg, Command};
use tracing_subscriber::EnvFilter;

use wad_export::{
    load_config,
    wad::{
        ExportSession, LevelBuilder, Linedef, LinedefFlags, RecordFormat, Sector, Sidedef, Thing,
        ThingOptions,
    },
    Config, LevelConfig,
};

/// Player 1 start
const PLAYER_START: u16 = 1;

/// Highest level number whose `MAPxx` marker fits a lump name
const MAX_LEVELS: u32 = 99;

fn main() -> anyhow::Result<()> {
    let matches = Command::new("wad-export")
        .about("Writes generated levels into a PWAD archive")
        .arg(
            Arg::new("config")
                .long("config")
                .takes_value(true)
                .value_parser(value_parser!(PathBuf))
                .default_value("wad-export.toml")
                .help("Path to the TOML configuration"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .takes_value(true)
                .value_parser(value_parser!(PathBuf))
                .default_value("output.wad")
                .help("Archive to write"),
        )
        .arg(
            Arg::new("levels")
                .long("levels")
                .takes_value(true)
                .value_parser(value_parser!(u32).range(1..=MAX_LEVELS as i64))
                .help("Number of levels to generate (1-99)"),
        )
        .arg(
            Arg::new("extended")
                .long("extended")
                .help("Write Hexen format things and linedefs"),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = matches
        .get_one::<PathBuf>("config")
        .context("missing --config")?;
    let output = matches
        .get_one::<PathBuf>("output")
        .context("missing --output")?;

    let mut config = load_config(config_path);
    if let Some(levels) = matches.get_one::<u32>("levels") {
        config.level.count = *levels;
    }
    if matches.is_present("extended") {
        config.game.extended_format = true;
    }

    export(config, output)
}

fn export(config: Config, output: &Path) -> anyhow::Result<()> {
    let extended = config.game.extended_format;
    let level_count = config.level.count;
    anyhow::ensure!(
        (1..=MAX_LEVELS).contains(&level_count),
        "level count {} is outside 1..={}",
        level_count,
        MAX_LEVELS
    );

    let mut session: ExportSession = ExportSession::new(config);
    session
        .start_archive(output)
        .with_context(|| format!("Unable to start {}", output.display()))?;

    if extended {
        session.set_record_format(RecordFormat::Extended)?;
    }

    for index in 0..level_count {
        let name = level_name(index);
        let span = tracing::info_span!("level", name = %name);
        let _enter = span.enter();

        let level_config = &session.config().level;
        let room = RoomLayout::from_config(level_config, index);
        build_room(session.begin_level()?, &room);
        session.end_level(&name)?;
    }

    session.end_archive().context("Export failed")?;
    tracing::info!("Wrote {} levels to {}", level_count, output.display());
    Ok(())
}

fn level_name(index: u32) -> String {
    format!("MAP{:02}", index + 1)
}

/// Sample level: a single square room with the player in the middle
struct RoomLayout {
    size: i16,
    floor_tex: String,
    ceil_tex: String,
    wall_tex: String,
    light: u16,
    ceil_h: i16,
}

impl RoomLayout {
    fn from_config(config: &LevelConfig, index: u32) -> Self {
        Self {
            size: config.room_size,
            floor_tex: config.floor_texture.clone(),
            ceil_tex: config.ceiling_texture.clone(),
            wall_tex: config.wall_texture.clone(),
            light: config.light,
            ceil_h: 128 + 16 * (index % 4) as i16,
        }
    }
}

fn build_room(level: &mut LevelBuilder, room: &RoomLayout) {
    let half = room.size / 2;

    let sector = level.add_sector(&Sector {
        floor_h: 0,
        floor_tex: room.floor_tex.clone(),
        ceil_h: room.ceil_h,
        ceil_tex: room.ceil_tex.clone(),
        light: room.light,
        special: 0,
        tag: 0,
    });

    let corners = [(-half, -half), (-half, half), (half, half), (half, -half)];
    let first_vertex = level.vertex_count();
    for &(x, y) in &corners {
        level.add_vertex(x, y);
    }

    for i in 0..corners.len() {
        let side = level.add_sidedef(&Sidedef {
            sector: sector as i16,
            lower_tex: "-".into(),
            mid_tex: room.wall_tex.clone(),
            upper_tex: "-".into(),
            x_offset: 0,
            y_offset: 0,
        });

        level.add_linedef(&Linedef {
            start: (first_vertex + i) as u16,
            end: (first_vertex + (i + 1) % corners.len()) as u16,
            front: Some(side as u16),
            back: None,
            flags: LinedefFlags::IMPASSIBLE,
            ..Default::default()
        });
    }

    level.add_thing(&Thing {
        thing_type: PLAYER_START,
        angle: 90,
        options: ThingOptions::ALL_SKILLS,
        ..Default::default()
    });
}
