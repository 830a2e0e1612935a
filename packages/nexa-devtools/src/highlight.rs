//! Per-element highlight ownership.
//!
//! Several toggle instances may outline the same element: a trigger carries
//! its passive highlight while another instance uses it as a target, or two
//! independent instances share a target. Each owner pushes a layer; the host
//! paints the topmost one and only restores the original style once the last
//! layer is released.

use std::cell::RefCell;

use smallvec::SmallVec;

use crate::host::{HighlightStyle, OverlayHost, OwnerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightLayer {
    /// Marks a trigger while its devtool is enabled.
    Passive,
    Target,
    Rendering,
}

#[derive(Debug, Clone)]
struct Layer {
    owner: OwnerId,
    layer: HighlightLayer,
    style: HighlightStyle,
}

type Stack = SmallVec<[Layer; 2]>;

enum Repaint {
    Restore,
    Layer(HighlightStyle),
    Unchanged,
}

#[derive(Debug)]
pub struct HighlightLayers<E> {
    stacks: RefCell<Vec<(E, Stack)>>,
}

impl<E> Default for HighlightLayers<E> {
    fn default() -> Self {
        Self {
            stacks: RefCell::new(Vec::new()),
        }
    }
}

impl<E: Clone + PartialEq> HighlightLayers<E> {
    /// Adds (or refreshes) `owner`'s layer on `element` and paints it on top.
    pub fn push<H>(
        &self,
        host: &H,
        element: &E,
        owner: OwnerId,
        layer: HighlightLayer,
        style: &HighlightStyle,
    ) where
        H: OverlayHost<Element = E> + ?Sized,
    {
        {
            let mut stacks = self.stacks.borrow_mut();
            let index = match stacks.iter().position(|(e, _)| e == element) {
                Some(index) => index,
                None => {
                    stacks.push((element.clone(), Stack::new()));
                    stacks.len() - 1
                }
            };
            let stack = &mut stacks[index].1;
            stack.retain(|l| !(l.owner == owner && l.layer == layer));
            stack.push(Layer {
                owner,
                layer,
                style: style.clone(),
            });
        }
        host.add_highlight(element, style);
    }

    /// Drops `owner`'s layer on `element`. The next layer down is repainted,
    /// or the element's own style restored when none is left.
    pub fn release<H>(&self, host: &H, element: &E, owner: OwnerId, layer: HighlightLayer)
    where
        H: OverlayHost<Element = E> + ?Sized,
    {
        let repaint = {
            let mut stacks = self.stacks.borrow_mut();
            let Some(index) = stacks.iter().position(|(e, _)| e == element) else {
                return;
            };
            let stack = &mut stacks[index].1;
            let Some(at) = stack
                .iter()
                .position(|l| l.owner == owner && l.layer == layer)
            else {
                return;
            };
            let was_top = at + 1 == stack.len();
            stack.remove(at);
            match stack.last() {
                None => {
                    stacks.swap_remove(index);
                    Repaint::Restore
                }
                Some(top) if was_top => Repaint::Layer(top.style.clone()),
                Some(_) => Repaint::Unchanged,
            }
        };

        match repaint {
            Repaint::Restore => host.remove_highlight(element),
            Repaint::Layer(style) => host.add_highlight(element, &style),
            Repaint::Unchanged => {}
        }
    }

    /// Number of owners currently highlighting `element`.
    pub fn depth(&self, element: &E) -> usize {
        self.stacks
            .borrow()
            .iter()
            .find(|(e, _)| e == element)
            .map_or(0, |(_, stack)| stack.len())
    }
}
