use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use shared::usuario::{Token, Usuario};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Profile cached at login; drives greetings and the admin gate without
    /// an extra round trip.
    #[serde(default)]
    pub usuario: Option<Usuario>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub server: Option<String>,
    pub token: Option<String>,
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Where the form-builder draft survives between sessions.
    pub fn rascunho_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("rascunho_formulario.json"))
    }

    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "nucleo", "nucleo")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;

        Ok(config_dir.to_path_buf())
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Stores a successful login: bearer token plus the cached profile.
    pub fn aplicar_login(&mut self, token: &Token) {
        self.remote.token = Some(token.access_token.clone());
        self.usuario = Some(token.usuario.clone());
    }

    /// Drops the session, keeping the configured server.
    pub fn limpar_sessao(&mut self) {
        self.remote.token = None;
        self.usuario = None;
    }

    pub fn logado(&self) -> bool {
        self.remote.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::usuario::TipoUsuario;

    fn token_de_teste() -> Token {
        Token {
            access_token: "tok-123".to_string(),
            token_type: "bearer".to_string(),
            usuario: Usuario {
                id: 1,
                email: "ana@nucleo.com".to_string(),
                nome: "Ana".to_string(),
                tipo: TipoUsuario::Consultor,
                telefone: None,
                data_nascimento: None,
                modelo_carro: None,
                placa_carro: None,
                informacoes_basicas: None,
                foto_url: None,
            },
        }
    }

    #[test]
    fn test_login_persiste_token_e_perfil() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.remote.server = Some("http://localhost:8000".to_string());
        config.aplicar_login(&token_de_teste());
        config.save_to(&path).unwrap();

        let relida = Config::load_from(&path).unwrap();
        assert_eq!(relida.remote.token.as_deref(), Some("tok-123"));
        assert_eq!(relida.usuario.as_ref().unwrap().nome, "Ana");
        assert!(relida.logado());
    }

    #[test]
    fn test_logout_limpa_sessao_e_mantem_servidor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.remote.server = Some("http://nucleo.interno:8000".to_string());
        config.aplicar_login(&token_de_teste());
        config.limpar_sessao();
        config.save_to(&path).unwrap();

        let relida = Config::load_from(&path).unwrap();
        assert!(relida.remote.token.is_none());
        assert!(relida.usuario.is_none());
        assert_eq!(
            relida.remote.server.as_deref(),
            Some("http://nucleo.interno:8000")
        );
    }

    #[test]
    fn test_config_ausente_usa_padrao() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nao_existe.toml")).unwrap();
        assert!(!config.logado());
        assert!(config.remote.server.is_none());
    }
}
