//! Exploration of disclosure widgets.
//!
//! Buttons that advertise a popup (`aria-haspopup`) or a collapsed state
//! (`aria-expanded="false"`) are hovered and clicked one at a time. When a
//! dialog shows up, the whole page is extracted again and every element not
//! seen before is tagged with the trigger that revealed it. Escape closes
//! the dialog before the next trigger. Plain action buttons are only
//! hovered, never clicked, and do not count against the interaction limit.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::time::Duration;

use super::safety::SafetyPolicy;
use crate::crawl_engine::page_timeout::with_page_timeout;
use crate::fetch::RenderedSession;
use crate::page_extractor::js_scripts::{DIALOG_VISIBLE_SCRIPT, SNAPSHOT_SCRIPT};
use crate::page_extractor::{
    DomSnapshot, Element, ElementExtractor, ElementSignature, StructuralDeduplicator,
    extract_elements,
};
use crate::utils::{EXPLORATION_SETTLE_MS, TRIGGER_CLICK_TIMEOUT_MS};

/// What the exploration pass needs from a live page.
#[async_trait]
pub trait InteractiveSurface: Send + Sync {
    /// Current DOM as a snapshot.
    async fn snapshot(&self) -> Result<DomSnapshot>;

    async fn hover(&self, index: usize) -> Result<()>;

    async fn click(&self, index: usize, timeout: Duration) -> Result<()>;

    /// Whether any dialog container is visible.
    async fn dialog_visible(&self) -> Result<bool>;

    /// Close whatever the last click opened.
    async fn dismiss(&self) -> Result<()>;

    async fn settle(&self, delay: Duration);
}

/// [`InteractiveSurface`] over a rendered session.
pub struct SessionSurface<'a, S: ?Sized> {
    session: &'a S,
}

impl<'a, S: RenderedSession + ?Sized> SessionSurface<'a, S> {
    #[must_use]
    pub fn new(session: &'a S) -> Self {
        Self { session }
    }
}

#[async_trait]
impl<S: RenderedSession + ?Sized> InteractiveSurface for SessionSurface<'_, S> {
    async fn snapshot(&self) -> Result<DomSnapshot> {
        let value = self.session.evaluate(SNAPSHOT_SCRIPT).await?;
        DomSnapshot::from_json(value).context("Unexpected snapshot shape")
    }

    async fn hover(&self, index: usize) -> Result<()> {
        self.session.hover_node(index).await
    }

    async fn click(&self, index: usize, timeout: Duration) -> Result<()> {
        with_page_timeout(self.session.click_node(index), timeout, "click").await
    }

    async fn dialog_visible(&self) -> Result<bool> {
        Ok(self
            .session
            .evaluate(DIALOG_VISIBLE_SCRIPT)
            .await?
            .as_bool()
            .unwrap_or(false))
    }

    async fn dismiss(&self) -> Result<()> {
        self.session.press_escape().await
    }

    async fn settle(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Whether a node's attributes mark it as a disclosure widget.
fn is_disclosure(snapshot: &DomSnapshot, index: usize) -> bool {
    let Some(node) = snapshot.node(index) else {
        return false;
    };
    let has_popup = node
        .attr("aria-haspopup")
        .map(str::trim)
        .is_some_and(|v| !v.is_empty() && !v.eq_ignore_ascii_case("false"));
    let collapsed = node
        .attr("aria-expanded")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("false"));
    has_popup || collapsed
}

fn button_candidates(snapshot: &DomSnapshot) -> Vec<(usize, Element)> {
    let excluded = StructuralDeduplicator::excluded(snapshot);
    ElementExtractor::new(snapshot, &excluded).button_candidates()
}

/// Runs the exploration loop for one page.
pub struct ExplorationPass<'p> {
    policy: &'p SafetyPolicy,
    click_timeout: Duration,
    settle: Duration,
}

impl<'p> ExplorationPass<'p> {
    #[must_use]
    pub fn new(policy: &'p SafetyPolicy) -> Self {
        Self {
            policy,
            click_timeout: Duration::from_millis(TRIGGER_CLICK_TIMEOUT_MS),
            settle: Duration::from_millis(EXPLORATION_SETTLE_MS),
        }
    }

    /// Override the click timeout and settle delay.
    #[must_use]
    pub fn with_timings(mut self, click_timeout: Duration, settle: Duration) -> Self {
        self.click_timeout = click_timeout;
        self.settle = settle;
        self
    }

    /// Explore `surface` and return the elements it revealed that are not in
    /// `base_elements`. Never fails: a broken trigger is logged and skipped.
    pub async fn run<T: InteractiveSurface + ?Sized>(
        &self,
        surface: &T,
        base_elements: &[Element],
    ) -> Vec<Element> {
        let mut snapshot = match surface.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(target: "sitescout::explore", "Cannot snapshot page for exploration: {e:#}");
                return Vec::new();
            }
        };

        let mut known: HashSet<ElementSignature> =
            base_elements.iter().map(Element::owned_signature).collect();
        let mut revealed = Vec::new();
        let mut interactions = 0usize;
        let mut dom_changed = false;

        for (initial_index, trigger) in button_candidates(&snapshot) {
            if interactions >= self.policy.max_interactions() {
                info!(
                    target: "sitescout::explore",
                    "Reached interaction limit of {}",
                    self.policy.max_interactions()
                );
                break;
            }

            if let Some(term) = self.policy.blocking_term(&trigger) {
                info!(
                    target: "sitescout::explore",
                    "Skipping unsafe trigger '{}' (matches '{term}')",
                    trigger.name
                );
                continue;
            }

            // Indices shift once a dialog has been opened; find the trigger again
            let index = if dom_changed {
                match surface.snapshot().await {
                    Ok(fresh) => {
                        snapshot = fresh;
                        dom_changed = false;
                    }
                    Err(e) => {
                        warn!(target: "sitescout::explore", "Cannot refresh snapshot: {e:#}");
                        break;
                    }
                }
                let signature = trigger.owned_signature();
                match button_candidates(&snapshot)
                    .into_iter()
                    .find(|(_, el)| el.owned_signature() == signature)
                {
                    Some((index, _)) => index,
                    None => {
                        debug!(
                            target: "sitescout::explore",
                            "Trigger '{}' is gone after the last interaction",
                            trigger.name
                        );
                        continue;
                    }
                }
            } else {
                initial_index
            };

            info!(target: "sitescout::explore", "Interacting with '{}'", trigger.name);
            match self.interact(surface, &snapshot, index, &trigger).await {
                Ok(Interaction { found, clicked }) => {
                    // Only clicks on disclosure triggers spend the budget
                    if clicked {
                        interactions += 1;
                        dom_changed = true;
                    }
                    for mut element in found {
                        if known.insert(element.owned_signature()) {
                            element.dynamic_context = Some(format!("after_{}", trigger.name));
                            revealed.push(element);
                        }
                    }
                }
                Err(e) => {
                    dom_changed = true;
                    warn!(
                        target: "sitescout::explore",
                        "Interaction with '{}' failed: {e:#}",
                        trigger.name
                    );
                }
            }
        }

        info!(
            target: "sitescout::explore",
            "Exploration found {} new elements after {interactions} interactions",
            revealed.len()
        );
        revealed
    }

    async fn interact<T: InteractiveSurface + ?Sized>(
        &self,
        surface: &T,
        snapshot: &DomSnapshot,
        index: usize,
        trigger: &Element,
    ) -> Result<Interaction> {
        surface.hover(index).await?;

        if !is_disclosure(snapshot, index) {
            return Ok(Interaction {
                found: Vec::new(),
                clicked: false,
            });
        }

        surface.click(index, self.click_timeout).await?;
        surface.settle(self.settle).await;

        let mut found = Vec::new();
        if surface.dialog_visible().await? {
            info!(target: "sitescout::explore", "Dialog opened by '{}'", trigger.name);
            let opened = surface.snapshot().await?;
            found = extract_elements(&opened);
            surface.dismiss().await?;
            surface.settle(self.settle).await;
        }

        Ok(Interaction {
            found,
            clicked: true,
        })
    }
}

struct Interaction {
    found: Vec<Element>,
    clicked: bool,
}
