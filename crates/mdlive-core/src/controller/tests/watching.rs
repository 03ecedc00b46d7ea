use super::*;
use pretty_assertions::assert_eq;

#[test]
fn file_change_refreshes_once_per_mtime_increase() {
    let fs = MemFs::default();
    let t0 = Instant::now();
    fs.write(DOC, 10, "# One");
    let mut ctl = started(&fs, t0);
    let first = tree_id(&ctl);

    assert!(tick(&mut ctl, t0 + ms(500)).is_empty());
    assert_eq!(tree_id(&ctl), first);

    fs.write(DOC, 11, "# Two");
    assert_eq!(tick(&mut ctl, t0 + ms(1_000)), vec![AppEffect::RequestFrame]);
    let second = tree_id(&ctl);
    assert!(second > first);
    assert_eq!(block_text(&ctl)[1][0], "# Two");
    assert_eq!(ctl.state().document.last_known_mod_time, Some(mtime(11)));

    assert!(tick(&mut ctl, t0 + ms(1_500)).is_empty());
    assert_eq!(tree_id(&ctl), second);
}

#[test]
fn each_refresh_releases_the_previous_tree() {
    let fs = MemFs::default();
    let t0 = Instant::now();
    fs.write(DOC, 10, "# One\n\ntext");
    let mut ctl = started(&fs, t0);
    let before = ctl.tree().unwrap().node_count();

    fs.write(DOC, 11, "changed");
    run_until(&mut ctl, t0 + ms(500));

    assert_eq!(ctl.refresh_controller().disposed_nodes(), before);
}

#[test]
fn transient_failures_never_reach_the_display() {
    let fs = MemFs::default();
    let t0 = Instant::now();
    fs.write(DOC, 10, "stable");
    let mut ctl = started(&fs, t0);
    let id = tree_id(&ctl);

    fs.write(DOC, 11, "unseen");
    fs.set_unreadable(true);
    run_until(&mut ctl, t0 + ms(1_000));
    assert_eq!(tree_id(&ctl), id);
    assert_eq!(ctl.state().view, ViewMode::Document);
    assert_eq!(ctl.state().document.last_known_mod_time, Some(mtime(10)));

    fs.set_unreadable(false);
    run_until(&mut ctl, t0 + ms(1_500));
    assert_eq!(ctl.state().document.raw_text, "unseen");
}

#[test]
fn reported_failures_are_logged_not_displayed() {
    let fs = MemFs::default();
    let t0 = Instant::now();
    fs.write(DOC, 10, "stable");
    let mut config = Config::default();
    config.watch.report_errors = true;
    let mut ctl = started_with(&fs, &config, t0);
    let id = tree_id(&ctl);

    fs.remove(DOC);
    assert!(tick(&mut ctl, t0 + ms(500)).is_empty());
    assert_eq!(tree_id(&ctl), id);
}

#[test]
fn file_appearing_after_failed_load_is_shown() {
    let fs = MemFs::default();
    let t0 = Instant::now();
    let mut ctl = started(&fs, t0);
    assert_eq!(ctl.tree().unwrap().kind, TreeKind::Error);

    fs.write(DOC, 1, "# Late");
    run_until(&mut ctl, t0 + ms(500));

    assert_eq!(ctl.tree().unwrap().kind, TreeKind::Document);
    assert_eq!(ctl.state().view, ViewMode::Document);
}

#[test]
fn poll_interval_follows_config() {
    let fs = MemFs::default();
    let t0 = Instant::now();
    fs.write(DOC, 1, "x");
    let mut config = Config::default();
    config.watch.interval_ms = 200;
    let ctl = started_with(&fs, &config, t0);

    assert_eq!(ctl.next_deadline(), Some(t0 + ms(200)));
}

#[test]
fn change_during_playback_swaps_source_without_refresh() {
    let fs = MemFs::default();
    let t0 = Instant::now();
    fs.write(DOC, 10, &"a".repeat(400));
    let mut config = Config::default();
    config.streaming.endless = true;
    let mut ctl = started_with(&fs, &config, t0);
    user(&mut ctl, UserAction::StartStreaming, t0);
    tick(&mut ctl, t0);
    let cursor = ctl.streaming().cursor();

    fs.write(DOC, 11, &"b".repeat(400));
    // Run the reveal ticks that fall before the poll.
    let poll_at = t0 + ms(500);
    while let Some(deadline) = ctl.next_deadline() {
        if deadline >= poll_at {
            break;
        }
        tick(&mut ctl, deadline);
    }
    let stream_cursor = ctl.streaming().cursor();
    assert!(stream_cursor >= cursor);

    ctl.handle(AppAction::Runtime(RuntimeAction::Tick), poll_at);

    assert_eq!(ctl.state().document.raw_text, "b".repeat(400));
    assert_eq!(ctl.streaming().source(), "b".repeat(400));
    assert_eq!(ctl.state().view, ViewMode::Stream);
    assert!(ctl.streaming().is_active());
    assert!(ctl.streaming().cursor() >= stream_cursor);
    assert_eq!(ctl.tree().unwrap().kind, TreeKind::Stream);
}
