use futures::{Stream, StreamExt};
use tracing::info;

use crate::reload::ReloaderTrait;
use crate::render::RendererTrait;
use crate::session::Session;
use crate::store::ChangeEvent;

impl<R, L> Session<R, L>
where
    R: RendererTrait,
    L: ReloaderTrait,
{
    /// Applies changes from `events` until the stream ends, returning how many were handled.
    ///
    /// Each change is fully applied, rendered and reloaded before the next one is read.
    pub async fn watch(&mut self, mut events: impl Stream<Item = ChangeEvent> + Unpin) -> usize {
        let mut handled = 0;
        while let Some(event) = events.next().await {
            self.handle(event).await;
            handled += 1;
        }
        info!("Change stream closed after {} changes", handled);
        handled
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;
    use crate::session::test_support::{Call, Calls, FakeReloader, FakeRenderer};
    use crate::store::StoreNode;
    use crate::tree::{ConfigTree, KeyPath};

    const ROOT: &str = "/rails/production";

    fn expected_tree(entries: &[(&str, &str)]) -> ConfigTree {
        let mut tree = ConfigTree::new();
        for (path, value) in entries {
            tree.set_leaf(&KeyPath::parse(path), value);
        }
        tree
    }

    #[compio::test]
    async fn every_render_sees_exactly_the_tree_after_its_change() {
        let snapshot = StoreNode::directory(
            ROOT,
            vec![StoreNode::directory(
                "/rails/production/database",
                vec![StoreNode::leaf("/rails/production/database/host", "db1")],
            )],
        );
        let calls = Calls::default();
        let mut session = Session::new(
            ROOT,
            ConfigTree::from_snapshot(&snapshot, ROOT),
            FakeRenderer::new(&calls),
            FakeReloader::new(&calls),
        );
        assert_eq!(session.tree().get_value(&["database", "host"]), Some("db1"));

        let handled = session
            .watch(stream::iter(vec![
                ChangeEvent::set("/rails/production/database/port", "5432"),
                ChangeEvent::delete("/rails/production/database/host"),
            ]))
            .await;

        assert_eq!(handled, 2);
        assert_eq!(
            calls.take(),
            vec![
                Call::Render(expected_tree(&[
                    ("database/host", "db1"),
                    ("database/port", "5432"),
                ])),
                Call::Reload,
                Call::Render(expected_tree(&[("database/port", "5432")])),
                Call::Reload,
            ]
        );
        assert!(session.tree().get(&["database", "host"]).is_none());
        assert_eq!(session.tree().get_value(&["database", "port"]), Some("5432"));
    }

    #[compio::test]
    async fn a_failed_render_does_not_stop_the_loop() {
        let calls = Calls::default();
        let mut session = Session::new(
            ROOT,
            ConfigTree::new(),
            FakeRenderer::failing_on(&calls, |tree| tree.get(&["broken"]).is_some()),
            FakeReloader::new(&calls),
        );

        session
            .watch(stream::iter(vec![
                ChangeEvent::set("/rails/production/broken", "1"),
                ChangeEvent::set("/rails/production/ok", "1"),
                ChangeEvent::delete("/rails/production/broken"),
            ]))
            .await;

        assert_eq!(
            calls.take(),
            vec![
                Call::Render(expected_tree(&[("broken", "1")])),
                Call::Render(expected_tree(&[("broken", "1"), ("ok", "1")])),
                Call::Render(expected_tree(&[("ok", "1")])),
                Call::Reload,
            ]
        );
    }

    #[compio::test]
    async fn later_changes_to_the_same_key_win() {
        let calls = Calls::default();
        let mut session = Session::new(
            ROOT,
            ConfigTree::new(),
            FakeRenderer::new(&calls),
            FakeReloader::new(&calls),
        );

        session
            .watch(stream::iter(vec![
                ChangeEvent::set("/rails/production/a/b/c", "1"),
                ChangeEvent::set("/rails/production/a/b/c", "2"),
            ]))
            .await;

        assert_eq!(session.tree().get_value(&["a", "b", "c"]), Some("2"));
        let a = session.tree().get(&["a"]).unwrap().as_directory().unwrap();
        assert_eq!(a.len(), 1);
    }

    #[compio::test]
    async fn returns_when_the_stream_is_empty() {
        let calls = Calls::default();
        let mut session = Session::new(
            ROOT,
            ConfigTree::new(),
            FakeRenderer::new(&calls),
            FakeReloader::new(&calls),
        );

        let handled = session.watch(stream::empty()).await;

        assert_eq!(handled, 0);
        assert!(calls.take().is_empty());
    }
}
