//! Effective configuration: remote layered over local

mod common;

use common::{config, MockServer};
use pretty_assertions::assert_eq;
use remote_config::loader::{RemoteConfigLoader, ResolveError};
use remote_config::provider::Mode;
use remote_config::registry::RegistryError;

const LOCAL: &str = r#"
db.default.driver = "X"
db.default.timeout = 5000
play.http.port = 9000
"#;

fn loader() -> RemoteConfigLoader {
    RemoteConfigLoader::builtin(Mode::Test)
}

#[test]
fn remote_values_win() {
    let server = MockServer::start(
        200,
        r#"{"node": {"dir": true, "nodes": [
            {"key": "/svc/db", "dir": true, "nodes": [
                {"key": "/svc/db/default", "dir": true, "nodes": [
                    {"key": "/svc/db/default/driver", "value": "\"Y\""},
                    {"key": "/svc/db/default/excludedIds", "value": "[1,2,3,4,5]"}
                ]}
            ]}
        ]}}"#,
    );
    let local = config(&format!(
        "{LOCAL}\n\
         remote-configuration.provider = etcd\n\
         remote-configuration.etcd.endpoint = \"{}\"\n\
         remote-configuration.etcd.prefix = svc",
        server.endpoint
    ));

    let effective = loader().resolve(&local).expect("resolve");

    assert_eq!(effective.get_string("db.default.driver").unwrap(), "Y");
    assert_eq!(effective.get_int("db.default.timeout").unwrap(), 5000);
    assert_eq!(
        effective.get_int_list("db.default.excludedIds").unwrap(),
        vec![1, 2, 3, 4, 5]
    );

    let port = server.endpoint.rsplit(':').next().unwrap().to_string();
    let rendered = effective
        .to_config_text()
        .to_string()
        .replace(&port, "PORT");
    insta::assert_snapshot!(rendered, @r###"
    db.default.driver = "Y"
    db.default.timeout = 5000
    db.default.excludedIds = [1, 2, 3, 4, 5]
    play.http.port = 9000
    remote-configuration.provider = "etcd"
    remote-configuration.etcd.endpoint = "http://127.0.0.1:PORT"
    remote-configuration.etcd.prefix = "svc"
    "###);
}

#[test]
fn http_document_over_local() {
    let server = MockServer::start(200, "my.key = \"Hello World\"\n");
    let local = config(&format!(
        "{LOCAL}\n\
         remote-configuration.provider = Http\n\
         remote-configuration.http.url = \"{}/app.conf\"",
        server.endpoint
    ));

    let effective = loader().resolve(&local).expect("resolve");

    assert_eq!(effective.get_string("my.key").unwrap(), "Hello World");
    assert_eq!(effective.get_string("db.default.driver").unwrap(), "X");
}

#[test]
fn unavailable_kv_store_keeps_local_configuration() {
    let server = MockServer::start(500, "");
    let local = config(&format!(
        "{LOCAL}\n\
         remote-configuration.provider = CONSUL\n\
         remote-configuration.consul.endpoint = \"{}\"",
        server.endpoint
    ));

    let effective = loader().resolve(&local).expect("resolve");

    assert_eq!(effective, local);
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn unknown_provider_fails_without_request() {
    let server = MockServer::start(200, "[]");
    let local = config(&format!(
        "remote-configuration.provider = vault\n\
         remote-configuration.consul.endpoint = \"{}\"",
        server.endpoint
    ));

    let err = loader().resolve(&local).expect_err("must fail");

    assert!(matches!(
        err,
        ResolveError::UnknownProvider(RegistryError::NotFound(ref name)) if name == "vault"
    ));
    assert_eq!(
        err.to_string(),
        "Can't resolve the remote configuration provider 'vault'"
    );
    assert!(server.requests().is_empty());
}

#[test]
fn no_provider_means_local_only() {
    let local = config(LOCAL);
    assert_eq!(loader().resolve(&local).unwrap(), local);
    assert!(loader().fetch(&local).unwrap().is_none());
}

#[test]
fn provider_failure_is_fatal() {
    let local = config(
        "remote-configuration.provider = consul\n\
         remote-configuration.consul.endpoint = \"ftp://consul\"",
    );

    let err = loader().resolve(&local).expect_err("must fail");
    assert_eq!(
        err.to_string(),
        "Can't retrieve remote configuration from HashiCorp Consul"
    );
}
