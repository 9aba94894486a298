mod renderer;

use std::time::Duration;

use anyhow::bail;
use stagehand_core::{RenderTree, Subscription};
use stagehand_runtime_std::StdRuntime;
use stagehand_transition::{TransitionHost, TransitionNode, TransitionProps};
use web_time::Instant;

use renderer::SimulatedRenderer;

const FRAME: Duration = Duration::from_millis(16);
const SETTLE_DEADLINE: Duration = Duration::from_secs(5);

fn fade(duration_ms: u32) -> TransitionProps {
    TransitionProps::new()
        .enter(&format!("transition-opacity duration-{duration_ms}"))
        .enter_from("opacity-0")
        .enter_to("opacity-100")
}

fn log_events(name: &'static str, node: &TransitionNode) -> Subscription {
    node.on_event(move |event| log::info!("{name}: {event:?}"))
}

fn run_until_settled(
    runtime: &StdRuntime,
    renderer: &mut SimulatedRenderer,
    nodes: &[&TransitionNode],
) -> anyhow::Result<u32> {
    let deadline = Instant::now() + SETTLE_DEADLINE;
    let mut frames = 0;
    runtime.drain_ui();
    while !nodes.iter().all(|node| node.is_settled()) {
        if Instant::now() > deadline {
            bail!("transitions did not settle within {SETTLE_DEADLINE:?}");
        }
        let now = runtime.pump_frame();
        renderer.on_frame(now)?;
        runtime.drain_ui();
        frames += 1;
        std::thread::sleep(FRAME);
    }
    Ok(frames)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let runtime = StdRuntime::new();
    let tree = RenderTree::new();
    let body = tree.create("body");
    let host = TransitionHost::new(runtime.runtime_handle(), tree.clone());
    let mut renderer = SimulatedRenderer::new(tree.clone());

    let panel = TransitionNode::new(
        &host,
        body,
        tree.create("section"),
        fade(200).shown(false).unmount(true),
        None,
    )?;
    let menu = TransitionNode::new(
        &host,
        panel.content(),
        tree.create("nav"),
        TransitionProps::new()
            .enter("transition-transform duration-150")
            .enter_from("-translate-x-full")
            .enter_to("translate-x-0"),
        Some(panel.coordinator()),
    )?;
    let items = (0..3)
        .map(|_| {
            TransitionNode::new(
                &host,
                menu.content(),
                tree.create("li"),
                fade(100),
                Some(menu.coordinator()),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let _subscriptions = [
        log_events("panel", &panel),
        log_events("menu", &menu),
        log_events("item 0", &items[0]),
        log_events("item 1", &items[1]),
        log_events("item 2", &items[2]),
    ];
    for node in [&panel, &menu].into_iter().chain(items.iter()) {
        renderer.watch(node.content())?;
    }

    let mut nodes = vec![&panel, &menu];
    nodes.extend(items.iter());

    for show in [true, false, true] {
        log::info!("panel.set_shown({show})");
        panel.set_shown(show);
        let frames = run_until_settled(&runtime, &mut renderer, &nodes)?;
        log::info!("settled after {frames} frame(s) as {:?}", panel.state());
        println!("{}", tree.dump_tree(body));
    }

    Ok(())
}
