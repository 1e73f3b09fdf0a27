use figment::Jail;
use idmig_config::IdmigConfig;

#[test]
fn legacy_variables_fill_config_values() {
    Jail::expect_with(|jail| {
        jail.set_env("AUTH0_TOKEN", "auth0-token");
        jail.set_env("AUTH0_TENANT_ID", "acme");
        jail.set_env("DESCOPE_PROJECT_ID", "P2abc");
        jail.set_env("DESCOPE_MANAGEMENT_KEY", "K2xyz");

        let config = IdmigConfig::load().expect("config loads");
        assert_eq!(config.source.token, "auth0-token");
        assert_eq!(config.source.tenant_id, "acme");
        assert_eq!(config.target.project_id, "P2abc");
        assert_eq!(config.target.management_key, "K2xyz");
        assert!(config.require_live().is_ok());
        Ok(())
    });
}

#[test]
fn prefixed_env_beats_legacy_variables() {
    Jail::expect_with(|jail| {
        jail.set_env("AUTH0_TOKEN", "legacy-token");
        jail.set_env("IDMIG_SOURCE__TOKEN", "prefixed-token");

        let config = IdmigConfig::load().expect("config loads");
        assert_eq!(config.source.token, "prefixed-token");
        Ok(())
    });
}

#[test]
fn dotenv_file_feeds_legacy_variables() {
    Jail::expect_with(|jail| {
        jail.create_file(
            ".env",
            "DESCOPE_PROJECT_ID=P2fromdotenv\nDESCOPE_MANAGEMENT_KEY=K2fromdotenv\n",
        )?;

        let config = IdmigConfig::load_with_dotenv().expect("config loads");
        assert_eq!(config.target.project_id, "P2fromdotenv");
        assert!(config.target.is_configured());

        // dotenvy writes into the process environment; the jail only restores
        // variables it set itself.
        restore_on_exit(&["DESCOPE_PROJECT_ID", "DESCOPE_MANAGEMENT_KEY"], jail);
        Ok(())
    });
}

fn restore_on_exit(keys: &[&str], jail: &mut Jail) {
    for key in keys {
        jail.set_env(key, "");
    }
}
