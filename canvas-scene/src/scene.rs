//! Scene snapshot handed over by the editor at export time.

use serde::{Deserialize, Serialize};

use crate::{Element, ElementId, SceneError, SceneResult};

/// Page orientation derived from the canvas aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Width is not greater than height.
    Portrait,
    /// Width is strictly greater than height.
    Landscape,
}

impl Orientation {
    /// Derive the orientation of a `width` x `height` page.
    #[must_use]
    pub fn for_size(width: u32, height: u32) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

/// A scene containing all canvas elements, the page background and the page size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// All elements in insertion order.
    #[serde(default)]
    elements: Vec<Element>,
    /// Page background: a color, an image URL or data URI, or nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Page width in pixels.
    pub canvas_width: u32,
    /// Page height in pixels.
    pub canvas_height: u32,
}

impl Scene {
    /// Create a new empty scene with the given page size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            elements: Vec::new(),
            background: None,
            canvas_width: width,
            canvas_height: height,
        }
    }

    /// Set the page background.
    #[must_use]
    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    /// Add an element to the scene.
    pub fn add_element(&mut self, element: Element) -> ElementId {
        let id = element.id.clone();
        self.elements.push(element);
        id
    }

    /// Remove an element from the scene.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn remove_element(&mut self, id: &ElementId) -> SceneResult<Element> {
        let index = self
            .elements
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| SceneError::ElementNotFound(id.to_string()))?;
        Ok(self.elements.remove(index))
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get_element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    /// Get a mutable reference to an element by ID.
    pub fn get_element_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| &e.id == id)
    }

    /// Get all elements in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Visible elements in drawing order.
    ///
    /// Sorted by ascending z-index; elements sharing a z-index keep their
    /// insertion order.
    #[must_use]
    pub fn stacking_order(&self) -> Vec<&Element> {
        let mut visible: Vec<_> = self.elements.iter().filter(|e| e.visible).collect();
        // `sort_by_key` is stable.
        visible.sort_by_key(|e| e.transform.z_index);
        visible
    }

    /// Orientation of the exported page.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        Orientation::for_size(self.canvas_width, self.canvas_height)
    }

    /// Get the number of elements in the scene.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Check if the scene is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Serialize the scene to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> SceneResult<String> {
        serde_json::to_string(self).map_err(SceneError::Serialization)
    }

    /// Deserialize a scene from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let scene: Self = serde_json::from_str(json).map_err(SceneError::Serialization)?;
        tracing::debug!(
            elements = scene.elements.len(),
            width = scene.canvas_width,
            height = scene.canvas_height,
            "Loaded scene snapshot"
        );
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementKind, TextContent, Transform};
    use proptest::prelude::*;

    fn rect(id: &str, z_index: i32) -> Element {
        Element::new(ElementKind::Rectangle {
            border_radius: None,
        })
        .with_id(id)
        .with_transform(Transform::new(0.0, 0.0, 10.0, 10.0).with_z_index(z_index))
    }

    #[test]
    fn test_scene_add_remove() {
        let mut scene = Scene::new(800, 600);
        assert!(scene.is_empty());

        let element = Element::new(ElementKind::Text(TextContent::new("Hello")));
        let id = scene.add_element(element);

        assert_eq!(scene.element_count(), 1);
        assert!(scene.get_element(&id).is_some());

        scene.remove_element(&id).expect("should remove");
        assert!(scene.is_empty());
        assert!(scene.remove_element(&id).is_err());
    }

    #[test]
    fn test_stacking_order_sorts_by_z_index() {
        let mut scene = Scene::new(100, 100);
        scene.add_element(rect("top", 5));
        scene.add_element(rect("bottom", -1));
        scene.add_element(rect("middle", 2));

        let ids: Vec<_> = scene.stacking_order().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["bottom", "middle", "top"]);
    }

    #[test]
    fn test_stacking_order_is_stable_on_ties() {
        let mut scene = Scene::new(100, 100);
        scene.add_element(rect("a", 1));
        scene.add_element(rect("b", 0));
        scene.add_element(rect("c", 1));
        scene.add_element(rect("d", 0));

        let ids: Vec<_> = scene.stacking_order().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["b", "d", "a", "c"]);
    }

    #[test]
    fn test_stacking_order_skips_invisible() {
        let mut scene = Scene::new(100, 100);
        scene.add_element(rect("shown", 0));
        scene.add_element(rect("hidden", 1).with_visible(false));

        let order = scene.stacking_order();
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].id.as_str(), "shown");
    }

    #[test]
    fn test_orientation() {
        assert_eq!(Scene::new(200, 100).orientation(), Orientation::Landscape);
        assert_eq!(Scene::new(100, 200).orientation(), Orientation::Portrait);
        assert_eq!(Scene::new(100, 100).orientation(), Orientation::Portrait);
    }

    #[test]
    fn test_json_roundtrip_keeps_order() {
        let mut scene = Scene::new(640, 480).with_background("#ff0000");
        scene.add_element(rect("first", 3));
        scene.add_element(rect("second", 1));

        let json = scene.to_json().expect("to json");
        assert!(json.contains("\"canvasWidth\":640"));
        let restored = Scene::from_json(&json).expect("from json");
        assert_eq!(restored, scene);
    }

    #[test]
    fn test_from_editor_payload() {
        let json = r##"{
            "canvasWidth": 1080,
            "canvasHeight": 1350,
            "background": "https://example.com/bg.png",
            "elements": [
                {"id":"1","type":"circle","x":10,"y":10,"width":50,"height":30,"visible":true,"zIndex":2},
                {"id":"2","type":"image","x":0,"y":0,"width":20,"height":20,"image":"data:image/png;base64,AAAA","visible":false}
            ]
        }"##;
        let scene = Scene::from_json(json).expect("parse");
        assert_eq!(scene.element_count(), 2);
        assert_eq!(scene.orientation(), Orientation::Portrait);
        assert_eq!(scene.stacking_order().len(), 1);
    }

    proptest! {
        #[test]
        fn prop_stacking_order_is_sorted_and_stable(
            z_indices in prop::collection::vec(-5i32..5, 0..40)
        ) {
            let mut scene = Scene::new(100, 100);
            for (idx, z) in z_indices.iter().enumerate() {
                scene.add_element(rect(&idx.to_string(), *z));
            }

            let order = scene.stacking_order();
            prop_assert_eq!(order.len(), z_indices.len());
            for pair in order.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                prop_assert!(a.transform.z_index <= b.transform.z_index);
                if a.transform.z_index == b.transform.z_index {
                    let ia: usize = a.id.as_str().parse().unwrap_or_default();
                    let ib: usize = b.id.as_str().parse().unwrap_or_default();
                    prop_assert!(ia < ib, "tie order must follow insertion order");
                }
            }
        }
    }
}
