use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::Sender;
use tripwire::Tripwire;

use super::client::{AppsClient, random_apps_url};
use super::error::Error;
use super::metrics::RefreshMetrics;
use super::targets::apps_to_target_groups;
use crate::{Discoverer, TargetGroup};

/// Periodically polls Marathon and sends the target groups of all apps,
/// followed by deletions of apps which are gone since the last refresh.
pub struct Discovery<C> {
    client: C,
    servers: Vec<String>,
    refresh_interval: Duration,
    metrics: RefreshMetrics,

    last_refresh: HashMap<String, TargetGroup>,
}

impl<C: AppsClient> Discovery<C> {
    pub fn new(
        client: C,
        servers: Vec<String>,
        refresh_interval: Duration,
        metrics: RefreshMetrics,
    ) -> Self {
        Discovery {
            client,
            servers,
            refresh_interval,
            metrics,
            last_refresh: HashMap::new(),
        }
    }

    /// Fetches the app list from one of the servers and builds a target
    /// group for every app.
    pub async fn fetch_target_groups(&self) -> Result<HashMap<String, TargetGroup>, Error> {
        let url = random_apps_url(&self.servers).ok_or(Error::NoServers)?;
        let apps = self.client.fetch_apps(&url).await?;

        debug!(
            message = "fetched marathon apps",
            %url,
            apps = apps.apps.len()
        );

        Ok(apps_to_target_groups(&apps))
    }

    /// Runs one refresh cycle and records how it went. Cancelled cycles are
    /// not recorded.
    async fn update_services(
        &mut self,
        output: &Sender<Vec<TargetGroup>>,
        shutdown: &mut Tripwire,
    ) -> Result<(), Error> {
        let start = Instant::now();
        let result = self.refresh(output, shutdown).await;

        match &result {
            Err(Error::Cancelled) => {}
            Err(err) => {
                self.metrics.observe(start.elapsed(), true);
                error!(message = "unable to refresh marathon targets", %err);
            }
            Ok(()) => self.metrics.observe(start.elapsed(), false),
        }

        result
    }

    async fn refresh(
        &mut self,
        output: &Sender<Vec<TargetGroup>>,
        shutdown: &mut Tripwire,
    ) -> Result<(), Error> {
        let groups = tokio::select! {
            biased;

            _ = &mut *shutdown => return Err(Error::Cancelled),
            result = self.fetch_target_groups() => result?,
        };

        let mut all = groups.values().cloned().collect::<Vec<_>>();
        all.sort_by(|a, b| a.source.cmp(&b.source));
        send(output, shutdown, all).await?;

        let mut deleted = self
            .last_refresh
            .keys()
            .filter(|source| !groups.contains_key(*source))
            .collect::<Vec<_>>();
        deleted.sort();

        for source in deleted {
            debug!(message = "marathon app removed", %source);

            send(output, shutdown, vec![TargetGroup::deleted(source.as_str())]).await?;
        }

        self.last_refresh = groups;

        Ok(())
    }
}

async fn send(
    output: &Sender<Vec<TargetGroup>>,
    shutdown: &mut Tripwire,
    groups: Vec<TargetGroup>,
) -> Result<(), Error> {
    tokio::select! {
        biased;

        _ = &mut *shutdown => Err(Error::Cancelled),
        result = output.send(groups) => result.map_err(|_| Error::OutputClosed),
    }
}

impl<C: AppsClient + 'static> Discoverer for Discovery<C> {
    async fn run(mut self, output: Sender<Vec<TargetGroup>>, mut shutdown: Tripwire) {
        info!(
            message = "start marathon service discovery",
            servers = ?self.servers,
            interval = ?self.refresh_interval,
        );

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.refresh_interval) => {}
            }

            match self.update_services(&output, &mut shutdown).await {
                Ok(()) => {}
                Err(Error::Cancelled) => break,
                Err(Error::OutputClosed) => {
                    warn!(message = "output of marathon discovery closed, stop discovering");
                    break;
                }
                // logged and recorded already
                Err(_) => {}
            }
        }

        info!(message = "marathon service discovery stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use http::StatusCode;
    use metrics::Registry;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use super::*;
    use crate::ADDRESS_LABEL;
    use crate::marathon::model::{App, AppList, Task};

    /// Replays canned responses, and keeps answering with the last one.
    #[derive(Clone, Default)]
    struct Scripted {
        responses: Arc<Mutex<VecDeque<Result<AppList, StatusCode>>>>,
        urls: Arc<Mutex<Vec<String>>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<AppList, StatusCode>>) -> Self {
            Scripted {
                responses: Arc::new(Mutex::new(responses.into())),
                urls: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl AppsClient for Scripted {
        async fn fetch_apps(&self, url: &str) -> Result<AppList, Error> {
            self.urls.lock().unwrap().push(url.to_string());

            let mut responses = self.responses.lock().unwrap();
            let resp = if responses.len() > 1 {
                responses.pop_front().unwrap()
            } else {
                responses.front().cloned().unwrap()
            };

            resp.map_err(Error::UnexpectedStatus)
        }
    }

    fn app(id: &str, port: u32) -> App {
        App {
            id: id.to_string(),
            running_tasks: 1,
            tasks: vec![Task {
                id: format!("{id}.task-1"),
                host: "mesos-slave1".to_string(),
                ports: vec![port],
                ip_addresses: vec![],
            }],
            ..Default::default()
        }
    }

    fn apps(apps: Vec<App>) -> AppList {
        AppList { apps }
    }

    fn discovery(client: Scripted, registry: &Registry) -> Discovery<Scripted> {
        Discovery::new(
            client,
            vec!["http://marathon:8080".to_string()],
            Duration::from_secs(30),
            RefreshMetrics::new(registry),
        )
    }

    #[tokio::test]
    async fn fetch_target_groups() {
        let client = Scripted::new(vec![Ok(apps(vec![app("/app1", 31000)]))]);
        let registry = Registry::new();
        let discovery = discovery(client.clone(), &registry);

        let groups = discovery.fetch_target_groups().await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups["/app1"].targets[0].get(ADDRESS_LABEL).unwrap(),
            "mesos-slave1:31000"
        );
        assert_eq!(
            client.urls.lock().unwrap().as_slice(),
            ["http://marathon:8080/v2/apps/?embed=apps.tasks"]
        );
    }

    #[tokio::test]
    async fn no_servers() {
        let registry = Registry::new();
        let mut discovery = discovery(Scripted::new(vec![Ok(apps(vec![]))]), &registry);
        discovery.servers.clear();

        assert!(matches!(
            discovery.fetch_target_groups().await,
            Err(Error::NoServers)
        ));
    }

    #[tokio::test]
    async fn deletion_after_disappearance() {
        let client = Scripted::new(vec![
            Ok(apps(vec![app("/app1", 31000), app("/app2", 31001)])),
            Ok(apps(vec![app("/app2", 31001)])),
        ]);
        let registry = Registry::new();
        let mut discovery = discovery(client, &registry);
        let (tx, mut rx) = mpsc::channel(8);
        let (_trigger, mut shutdown) = Tripwire::new();

        discovery.update_services(&tx, &mut shutdown).await.unwrap();
        let first = rx.recv().await.unwrap();
        assert_eq!(
            first.iter().map(|g| g.source.as_str()).collect::<Vec<_>>(),
            ["/app1", "/app2"]
        );
        assert!(rx.try_recv().is_err());

        discovery.update_services(&tx, &mut shutdown).await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].source, "/app2");

        let deletion = rx.recv().await.unwrap();
        assert_eq!(deletion, vec![TargetGroup::deleted("/app1")]);
        assert!(rx.try_recv().is_err());

        assert_eq!(discovery.last_refresh.len(), 1);
        assert_eq!(discovery.metrics.refreshes(), 2);
        assert_eq!(discovery.metrics.failures(), 0);
    }

    #[tokio::test]
    async fn unchanged_apps_emit_no_deletions() {
        let client = Scripted::new(vec![Ok(apps(vec![app("/app1", 31000)]))]);
        let registry = Registry::new();
        let mut discovery = discovery(client, &registry);
        let (tx, mut rx) = mpsc::channel(8);
        let (_trigger, mut shutdown) = Tripwire::new();

        for _ in 0..3 {
            discovery.update_services(&tx, &mut shutdown).await.unwrap();
            let batch = rx.recv().await.unwrap();
            assert_eq!(batch.len(), 1);
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn failure_keeps_previous_state() {
        let client = Scripted::new(vec![
            Ok(apps(vec![app("/app1", 31000)])),
            Err(StatusCode::SERVICE_UNAVAILABLE),
            Ok(apps(vec![])),
        ]);
        let registry = Registry::new();
        let mut discovery = discovery(client, &registry);
        let (tx, mut rx) = mpsc::channel(8);
        let (_trigger, mut shutdown) = Tripwire::new();

        discovery.update_services(&tx, &mut shutdown).await.unwrap();
        rx.recv().await.unwrap();

        let err = discovery
            .update_services(&tx, &mut shutdown)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedStatus(StatusCode::SERVICE_UNAVAILABLE)
        ));
        assert!(rx.try_recv().is_err());
        assert!(discovery.last_refresh.contains_key("/app1"));
        assert_eq!(discovery.metrics.failures(), 1);

        // the app is still known, so it gets deleted once Marathon is back
        discovery.update_services(&tx, &mut shutdown).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), vec![]);
        assert_eq!(
            rx.recv().await.unwrap(),
            vec![TargetGroup::deleted("/app1")]
        );
        assert_eq!(discovery.metrics.refreshes(), 3);
    }

    /// Never answers, like a Marathon which accepted the connection and hangs.
    struct Stalled;

    #[async_trait]
    impl AppsClient for Stalled {
        async fn fetch_apps(&self, _url: &str) -> Result<AppList, Error> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn cancel_while_fetching() {
        let registry = Registry::new();
        let mut discovery = Discovery::new(
            Stalled,
            vec!["http://marathon:8080".to_string()],
            Duration::from_secs(30),
            RefreshMetrics::new(&registry),
        );
        discovery
            .last_refresh
            .insert("/app1".to_string(), TargetGroup::deleted("/app1"));

        let (tx, mut rx) = mpsc::channel(1);
        let (trigger, mut shutdown) = Tripwire::new();

        let handle = tokio::spawn(async move {
            let result = discovery.update_services(&tx, &mut shutdown).await;
            (result, discovery)
        });

        tokio::task::yield_now().await;
        trigger.cancel();

        let (result, discovery) = handle.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(rx.try_recv().is_err());
        assert!(discovery.last_refresh.contains_key("/app1"));
        assert_eq!(discovery.metrics.refreshes(), 0);
        assert_eq!(discovery.metrics.failures(), 0);
    }

    #[tokio::test]
    async fn cancel_while_blocked_on_output() {
        let client = Scripted::new(vec![
            Ok(apps(vec![app("/app1", 31000)])),
            Ok(apps(vec![app("/app2", 31001)])),
        ]);
        let registry = Registry::new();
        let mut discovery = discovery(client, &registry);
        let (tx, mut rx) = mpsc::channel(1);
        let (trigger, mut shutdown) = Tripwire::new();

        discovery.update_services(&tx, &mut shutdown).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().len(), 1);

        // fill the channel so the next batch blocks
        tx.send(vec![]).await.unwrap();
        let handle = tokio::spawn(async move {
            let result = discovery.update_services(&tx, &mut shutdown).await;
            (result, discovery)
        });

        tokio::task::yield_now().await;
        trigger.cancel();

        let (result, discovery) = handle.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(discovery.last_refresh.contains_key("/app1"));
        assert!(!discovery.last_refresh.contains_key("/app2"));
        assert_eq!(discovery.metrics.refreshes(), 1);
        assert_eq!(discovery.metrics.failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_before_first_refresh() {
        let client = Scripted::new(vec![Ok(apps(vec![app("/app1", 31000)]))]);
        let registry = Registry::new();
        let discovery = discovery(client.clone(), &registry);
        let (tx, mut rx) = mpsc::channel(1);
        let (trigger, shutdown) = Tripwire::new();

        let handle = tokio::spawn(discovery.run(tx, shutdown));

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(client.urls.lock().unwrap().is_empty());

        let batch = rx.recv().await.unwrap();
        assert_eq!(batch[0].source, "/app1");
        assert_eq!(client.urls.lock().unwrap().len(), 1);

        trigger.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_wait() {
        let client = Scripted::new(vec![Ok(apps(vec![]))]);
        let registry = Registry::new();
        let discovery = discovery(client.clone(), &registry);
        let (tx, _rx) = mpsc::channel(1);
        let (trigger, shutdown) = Tripwire::new();

        let handle = tokio::spawn(discovery.run(tx, shutdown));
        tokio::time::sleep(Duration::from_secs(10)).await;
        trigger.cancel();

        handle.await.unwrap();
        assert!(client.urls.lock().unwrap().is_empty());
        assert_eq!(RefreshMetrics::new(&registry).refreshes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_do_not_stop_the_loop() {
        let client = Scripted::new(vec![
            Err(StatusCode::INTERNAL_SERVER_ERROR),
            Err(StatusCode::BAD_GATEWAY),
            Ok(apps(vec![app("/app1", 31000)])),
        ]);
        let registry = Registry::new();
        let discovery = discovery(client.clone(), &registry);
        let (tx, mut rx) = mpsc::channel(1);
        let (trigger, shutdown) = Tripwire::new();

        let handle = tokio::spawn(discovery.run(tx, shutdown));

        let batch = rx.recv().await.unwrap();
        assert_eq!(batch[0].source, "/app1");
        assert_eq!(client.urls.lock().unwrap().len(), 3);

        let metrics = RefreshMetrics::new(&registry);
        assert_eq!(metrics.failures(), 2);

        trigger.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn closed_output_stops_the_loop() {
        let client = Scripted::new(vec![Ok(apps(vec![app("/app1", 31000)]))]);
        let registry = Registry::new();
        let discovery = discovery(client.clone(), &registry);
        let (tx, rx) = mpsc::channel(1);
        let (_trigger, shutdown) = Tripwire::new();

        drop(rx);
        discovery.run(tx, shutdown).await;

        assert_eq!(client.urls.lock().unwrap().len(), 1);
        assert_eq!(RefreshMetrics::new(&registry).failures(), 1);
    }
}
