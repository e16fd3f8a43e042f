use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod lump;
pub mod sky;
pub mod wad;

/// Target game of the exported archive
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Game {
    #[default]
    Doom,
    Heretic,
    Hexen,
}

impl Game {
    /// Pre-made patch lumps loaded from the data directory
    pub fn external_patches(self) -> &'static [&'static str] {
        match self {
            Game::Doom => &[
                "W74A_1", "W74A_2", "W74B_1", // FIREMAGx (water)
                "WALL64_2", "W64B_1", "W64B_2", // ROCKREDx (lava)
                "RP2_1", "RP2_2", "RP2_3", "RP2_4", // BLODRIPx (blood)
                "TP5_1", "TP5_2", "TP5_3", "TP5_4", // BLODGRx (nukage)
            ],
            Game::Heretic | Game::Hexen => &[],
        }
    }

    /// Patch lump that holds the sky texture
    pub fn sky_lump_name(self) -> &'static str {
        match self {
            Game::Doom => "RSKY1",
            Game::Heretic | Game::Hexen => "SKY1",
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub game: Game,
    /// Write Hexen style things and linedefs
    pub extended_format: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory containing the `data/` folder with pre-made lumps
    pub install_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            install_path: ".".into(),
        }
    }
}

impl DataConfig {
    pub fn lump_path(&self, name: &str) -> PathBuf {
        Path::new(&self.install_path)
            .join("data")
            .join(format!("{}.lmp", name))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkyTheme {
    #[default]
    Clouds,
    Hell,
    Blue,
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct SkyConfig {
    pub theme: SkyTheme,
    pub seed: u64,
    pub width: u16,
    pub height: u16,
    pub hills: bool,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            theme: SkyTheme::Clouds,
            seed: 1,
            width: 256,
            height: 128,
            hills: true,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub count: u32,
    pub room_size: i16,
    pub floor_texture: String,
    pub ceiling_texture: String,
    pub wall_texture: String,
    pub light: u16,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            count: 1,
            room_size: 512,
            floor_texture: "FLOOR4_8".into(),
            ceiling_texture: "CEIL3_5".into(),
            wall_texture: "STARTAN3".into(),
            light: 192,
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub data: DataConfig,
    pub sky: SkyConfig,
    pub level: LevelConfig,
}

impl Config {
    /// The effective configuration as TOML, one entry per line
    pub fn to_lines(&self) -> Result<Vec<String>, toml::ser::Error> {
        let text = toml::to_string(self)?;
        Ok(text.lines().map(str::to_string).collect())
    }
}

pub fn load_config(path: &Path) -> Config {
    let toml_str = match std::fs::read_to_string(path) {
        Ok(toml_str) => toml_str,
        Err(error) => {
            println!(
                "Failed to load configuration from {} with error: {}",
                path.to_string_lossy(),
                error
            );
            return Config::default();
        }
    };

    match toml::from_str(&toml_str) {
        Ok(config) => {
            println!("Read configuration from {}", path.to_string_lossy());
            config
        }
        Err(error) => {
            println!(
                "Failed to load configuration from {} with error: {}",
                path.to_string_lossy(),
                error
            );
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [game]
            game = "hexen"

            [sky]
            theme = "hell"
            "#,
        )
        .unwrap();

        assert_eq!(config.game.game, Game::Hexen);
        assert!(!config.game.extended_format);
        assert_eq!(config.sky.theme, SkyTheme::Hell);
        assert_eq!(config.sky.width, 256);
        assert_eq!(config.level.wall_texture, "STARTAN3");
    }

    #[test]
    fn test_config_lines_round_trip() {
        let lines = Config::default().to_lines().unwrap();

        assert!(lines.iter().any(|line| line == "[game]"));
        assert!(lines.iter().any(|line| line == "game = \"doom\""));

        let reparsed: Config = toml::from_str(&lines.join("\n")).unwrap();
        assert_eq!(reparsed.sky.height, 128);
    }

    #[test]
    fn test_lump_path() {
        let data = DataConfig {
            install_path: "/opt/gen".into(),
        };
        assert_eq!(data.lump_path("RP2_1"), PathBuf::from("/opt/gen/data/RP2_1.lmp"));
    }

    #[test]
    fn test_missing_config_file_gives_defaults() {
        let config = load_config(Path::new("/nonexistent/wad-export.toml"));
        assert_eq!(config.game.game, Game::Doom);
    }
}
