//! Engine classes, global enums and global constants scripts see by default.
//!
//! This is a subset of the engine's reflection data: enough of the class tree
//! for scripts to extend nodes and resources, plus the members analysis and
//! tests touch.

use orchestrator_core::{MethodFlags, MethodInfo, PropertyInfo, Variant, VariantType};

use crate::class_db::{ClassRegistry, NativeClass};

fn arg(ty: VariantType, name: &str) -> PropertyInfo {
    PropertyInfo::new(ty, name)
}

fn ret(ty: VariantType) -> PropertyInfo {
    PropertyInfo::new(ty, "")
}

fn ret_object(class_name: &str) -> PropertyInfo {
    PropertyInfo::object("", class_name)
}

fn virtual_method(name: &str) -> MethodInfo {
    MethodInfo::new(name).with_flags(MethodFlags::VIRTUAL)
}

/// Populate `registry` with the core classes.
pub fn register(registry: &mut ClassRegistry) {
    registry
        .register(
            NativeClass::new("Object", None)
                .method(MethodInfo::new("get_class").with_return(ret(VariantType::String)))
                .method(
                    MethodInfo::new("is_class")
                        .with_args(vec![arg(VariantType::String, "class")])
                        .with_return(ret(VariantType::Bool))
                        .with_flags(MethodFlags::CONST),
                )
                .method(
                    MethodInfo::new("get")
                        .with_args(vec![arg(VariantType::StringName, "property")])
                        .with_return(PropertyInfo::variant("")),
                )
                .method(MethodInfo::new("set").with_args(vec![
                    arg(VariantType::StringName, "property"),
                    PropertyInfo::variant("value"),
                ]))
                .method(
                    MethodInfo::new("has_method")
                        .with_args(vec![arg(VariantType::StringName, "method")])
                        .with_return(ret(VariantType::Bool)),
                )
                .method(
                    MethodInfo::new("call")
                        .with_args(vec![arg(VariantType::StringName, "method")])
                        .with_return(PropertyInfo::variant(""))
                        .with_flags(MethodFlags::VARARG),
                )
                .method(
                    MethodInfo::new("emit_signal")
                        .with_args(vec![arg(VariantType::StringName, "signal")])
                        .with_return(PropertyInfo::enumeration("", "Error"))
                        .with_flags(MethodFlags::VARARG),
                )
                .method(
                    MethodInfo::new("connect")
                        .with_args(vec![
                            arg(VariantType::StringName, "signal"),
                            arg(VariantType::Callable, "callable"),
                            arg(VariantType::Int, "flags"),
                        ])
                        .with_defaults(vec![Variant::Int(0)])
                        .with_return(PropertyInfo::enumeration("", "Error")),
                )
                .method(MethodInfo::new("free"))
                .method(virtual_method("_init"))
                .method(
                    virtual_method("_to_string").with_return(ret(VariantType::String)),
                )
                .method(virtual_method("_notification").with_args(vec![arg(VariantType::Int, "what")]))
                .signal(MethodInfo::new("script_changed"))
                .signal(MethodInfo::new("property_list_changed"))
                .constant("NOTIFICATION_POSTINITIALIZE", 0)
                .constant("NOTIFICATION_PREDELETE", 1)
                .enumeration(
                    "ConnectFlags",
                    &[
                        ("CONNECT_DEFERRED", 1),
                        ("CONNECT_PERSIST", 2),
                        ("CONNECT_ONE_SHOT", 4),
                        ("CONNECT_REFERENCE_COUNTED", 8),
                    ],
                ),
        )
        .register(
            NativeClass::new("RefCounted", Some("Object"))
                .method(MethodInfo::new("reference").with_return(ret(VariantType::Bool)))
                .method(MethodInfo::new("unreference").with_return(ret(VariantType::Bool)))
                .method(MethodInfo::new("get_reference_count").with_return(ret(VariantType::Int))),
        )
        .register(
            NativeClass::new("Resource", Some("RefCounted"))
                .property(arg(VariantType::String, "resource_path"))
                .property(arg(VariantType::String, "resource_name"))
                .method(
                    MethodInfo::new("duplicate")
                        .with_args(vec![arg(VariantType::Bool, "subresources")])
                        .with_defaults(vec![Variant::Bool(false)])
                        .with_return(ret_object("Resource")),
                )
                .signal(MethodInfo::new("changed")),
        )
        .register(
            NativeClass::new("Script", Some("Resource"))
                .abstract_class()
                .method(MethodInfo::new("get_base_script").with_return(ret_object("Script")))
                .method(MethodInfo::new("get_instance_base_type").with_return(ret(VariantType::StringName)))
                .method(
                    MethodInfo::new("new")
                        .with_return(PropertyInfo::variant(""))
                        .with_flags(MethodFlags::VARARG),
                ),
        )
        .register(NativeClass::new("OScript", Some("Script")))
        .register(NativeClass::new("Texture2D", Some("Resource"))
            .abstract_class()
            .method(MethodInfo::new("get_width").with_return(ret(VariantType::Int)))
            .method(MethodInfo::new("get_height").with_return(ret(VariantType::Int)))
            .method(MethodInfo::new("get_size").with_return(ret(VariantType::Vector2))))
        .register(
            NativeClass::new("PackedScene", Some("Resource")).method(
                MethodInfo::new("instantiate")
                    .with_args(vec![arg(VariantType::Int, "edit_state")])
                    .with_defaults(vec![Variant::Int(0)])
                    .with_return(ret_object("Node")),
            ),
        )
        .register(
            NativeClass::new("InputEvent", Some("Resource"))
                .method(
                    MethodInfo::new("is_pressed")
                        .with_return(ret(VariantType::Bool))
                        .with_flags(MethodFlags::CONST),
                )
                .method(
                    MethodInfo::new("is_action_pressed")
                        .with_args(vec![arg(VariantType::StringName, "action")])
                        .with_return(ret(VariantType::Bool)),
                ),
        )
        .register(node_class())
        .register(
            NativeClass::new("CanvasItem", Some("Node"))
                .abstract_class()
                .property(arg(VariantType::Bool, "visible"))
                .property(arg(VariantType::Color, "modulate"))
                .method(MethodInfo::new("show"))
                .method(MethodInfo::new("hide"))
                .method(MethodInfo::new("queue_redraw"))
                .method(virtual_method("_draw"))
                .signal(MethodInfo::new("draw"))
                .signal(MethodInfo::new("visibility_changed")),
        )
        .register(
            NativeClass::new("Node2D", Some("CanvasItem"))
                .property(arg(VariantType::Vector2, "position"))
                .property(arg(VariantType::Float, "rotation"))
                .property(arg(VariantType::Vector2, "scale"))
                .property(arg(VariantType::Vector2, "global_position"))
                .method(MethodInfo::new("translate").with_args(vec![arg(VariantType::Vector2, "offset")]))
                .method(MethodInfo::new("rotate").with_args(vec![arg(VariantType::Float, "radians")]))
                .method(MethodInfo::new("look_at").with_args(vec![arg(VariantType::Vector2, "point")])),
        )
        .register(
            NativeClass::new("Sprite2D", Some("Node2D"))
                .property(PropertyInfo::object("texture", "Texture2D"))
                .property(arg(VariantType::Bool, "centered"))
                .property(arg(VariantType::Vector2, "offset"))
                .property(arg(VariantType::Int, "frame"))
                .signal(MethodInfo::new("frame_changed"))
                .signal(MethodInfo::new("texture_changed")),
        )
        .register(
            NativeClass::new("Control", Some("CanvasItem"))
                .property(arg(VariantType::Vector2, "size"))
                .property(arg(VariantType::Vector2, "position"))
                .property(PropertyInfo::enumeration("mouse_filter", "Control.MouseFilter"))
                .method(MethodInfo::new("grab_focus"))
                .method(MethodInfo::new("has_focus").with_return(ret(VariantType::Bool)))
                .signal(MethodInfo::new("resized"))
                .signal(MethodInfo::new("focus_entered"))
                .enumeration(
                    "MouseFilter",
                    &[
                        ("MOUSE_FILTER_STOP", 0),
                        ("MOUSE_FILTER_PASS", 1),
                        ("MOUSE_FILTER_IGNORE", 2),
                    ],
                ),
        )
        .register(
            NativeClass::new("Label", Some("Control"))
                .property(arg(VariantType::String, "text"))
                .method(MethodInfo::new("get_line_count").with_return(ret(VariantType::Int))),
        )
        .register(
            NativeClass::new("BaseButton", Some("Control"))
                .abstract_class()
                .property(arg(VariantType::Bool, "disabled"))
                .signal(MethodInfo::new("pressed"))
                .signal(MethodInfo::new("toggled").with_args(vec![arg(VariantType::Bool, "toggled_on")])),
        )
        .register(NativeClass::new("Button", Some("BaseButton")).property(arg(VariantType::String, "text")))
        .register(
            NativeClass::new("Node3D", Some("Node"))
                .property(arg(VariantType::Vector3, "position"))
                .property(arg(VariantType::Vector3, "rotation"))
                .property(arg(VariantType::Transform3D, "transform"))
                .method(MethodInfo::new("translate").with_args(vec![arg(VariantType::Vector3, "offset")])),
        )
        .register(
            NativeClass::new("Timer", Some("Node"))
                .property(arg(VariantType::Float, "wait_time"))
                .property(arg(VariantType::Bool, "one_shot"))
                .property(arg(VariantType::Bool, "autostart"))
                .method(
                    MethodInfo::new("start")
                        .with_args(vec![arg(VariantType::Float, "time_sec")])
                        .with_defaults(vec![Variant::float(-1.0)]),
                )
                .method(MethodInfo::new("stop"))
                .method(MethodInfo::new("is_stopped").with_return(ret(VariantType::Bool)))
                .signal(MethodInfo::new("timeout")),
        )
        .register(
            NativeClass::new("Input", Some("Object"))
                .method(
                    MethodInfo::new("is_action_pressed")
                        .with_args(vec![arg(VariantType::StringName, "action")])
                        .with_return(ret(VariantType::Bool)),
                )
                .method(
                    MethodInfo::new("get_vector")
                        .with_args(vec![
                            arg(VariantType::StringName, "negative_x"),
                            arg(VariantType::StringName, "positive_x"),
                            arg(VariantType::StringName, "negative_y"),
                            arg(VariantType::StringName, "positive_y"),
                        ])
                        .with_return(ret(VariantType::Vector2)),
                )
                .enumeration(
                    "MouseMode",
                    &[("MOUSE_MODE_VISIBLE", 0), ("MOUSE_MODE_HIDDEN", 1), ("MOUSE_MODE_CAPTURED", 2)],
                ),
        )
        .register(
            NativeClass::new("SceneTree", Some("Object"))
                .method(MethodInfo::new("quit").with_args(vec![arg(VariantType::Int, "exit_code")]).with_defaults(vec![Variant::Int(0)]))
                .method(
                    MethodInfo::new("create_timer")
                        .with_args(vec![arg(VariantType::Float, "time_sec")])
                        .with_return(ret_object("SceneTreeTimer")),
                )
                .signal(MethodInfo::new("process_frame"))
                .signal(MethodInfo::new("physics_frame")),
        )
        .register(NativeClass::new("SceneTreeTimer", Some("RefCounted")).signal(MethodInfo::new("timeout")))
        .register_singleton("Input", "Input");

    registry
        .register_global_enum(
            "Error",
            &[
                ("OK", 0),
                ("FAILED", 1),
                ("ERR_UNAVAILABLE", 2),
                ("ERR_UNCONFIGURED", 3),
                ("ERR_UNAUTHORIZED", 4),
                ("ERR_PARAMETER_RANGE_ERROR", 5),
                ("ERR_OUT_OF_MEMORY", 6),
                ("ERR_FILE_NOT_FOUND", 7),
                ("ERR_CANT_OPEN", 19),
                ("ERR_PARSE_ERROR", 43),
                ("ERR_CYCLIC_LINK", 45),
            ],
        )
        .register_global_enum("Side", &[("SIDE_LEFT", 0), ("SIDE_TOP", 1), ("SIDE_RIGHT", 2), ("SIDE_BOTTOM", 3)])
        .register_global_enum(
            "Key",
            &[("KEY_NONE", 0), ("KEY_SPACE", 32), ("KEY_ESCAPE", 4_194_305), ("KEY_ENTER", 4_194_309)],
        )
        .register_global_enum(
            "MouseButton",
            &[("MOUSE_BUTTON_NONE", 0), ("MOUSE_BUTTON_LEFT", 1), ("MOUSE_BUTTON_RIGHT", 2)],
        );

    let variant_types: Vec<(String, i64)> = VariantType::ALL
        .iter()
        .map(|ty| (variant_type_constant(*ty), i64::from(u8::from(*ty))))
        .collect();
    let variant_types: Vec<(&str, i64)> = variant_types.iter().map(|(n, v)| (n.as_str(), *v)).collect();
    registry.register_global_enum("Variant.Type", &variant_types);

    registry
        .register_global_constant("TYPE_MAX", VariantType::COUNT as i64)
        .register_global_constant("INLINE_ALIGNMENT_TOP", 0);
}

/// `TYPE_*` constant name of a variant type, e.g. `TYPE_VECTOR2I`.
fn variant_type_constant(ty: VariantType) -> String {
    let name = match ty {
        VariantType::Aabb => "AABB".to_string(),
        VariantType::Rid => "RID".to_string(),
        VariantType::Transform2D => "TRANSFORM2D".to_string(),
        VariantType::Transform3D => "TRANSFORM3D".to_string(),
        VariantType::StringName => "STRING_NAME".to_string(),
        VariantType::NodePath => "NODE_PATH".to_string(),
        other => {
            let mut out = String::new();
            for (i, c) in other.name().chars().enumerate() {
                if c.is_ascii_uppercase() && i > 0 && other.is_packed_array() && !out.ends_with('_') {
                    out.push('_');
                }
                out.push(c.to_ascii_uppercase());
            }
            out
        }
    };
    format!("TYPE_{name}")
}

fn node_class() -> NativeClass {
    NativeClass::new("Node", Some("Object"))
        .property(arg(VariantType::StringName, "name"))
        .property(arg(VariantType::String, "scene_file_path"))
        .property(PropertyInfo::object("owner", "Node"))
        .property(PropertyInfo::enumeration("process_mode", "Node.ProcessMode"))
        .method(
            MethodInfo::new("get_node")
                .with_args(vec![arg(VariantType::NodePath, "path")])
                .with_return(ret_object("Node")),
        )
        .method(
            MethodInfo::new("get_node_or_null")
                .with_args(vec![arg(VariantType::NodePath, "path")])
                .with_return(ret_object("Node")),
        )
        .method(
            MethodInfo::new("add_child")
                .with_args(vec![
                    PropertyInfo::object("node", "Node"),
                    arg(VariantType::Bool, "force_readable_name"),
                ])
                .with_defaults(vec![Variant::Bool(false)]),
        )
        .method(MethodInfo::new("remove_child").with_args(vec![PropertyInfo::object("node", "Node")]))
        .method(MethodInfo::new("get_parent").with_return(ret_object("Node")))
        .method(MethodInfo::new("get_child_count").with_return(ret(VariantType::Int)))
        .method(MethodInfo::new("get_tree").with_return(ret_object("SceneTree")))
        .method(MethodInfo::new("queue_free"))
        .method(MethodInfo::new("is_inside_tree").with_return(ret(VariantType::Bool)))
        .method(virtual_method("_ready"))
        .method(virtual_method("_enter_tree"))
        .method(virtual_method("_exit_tree"))
        .method(virtual_method("_process").with_args(vec![arg(VariantType::Float, "delta")]))
        .method(virtual_method("_physics_process").with_args(vec![arg(VariantType::Float, "delta")]))
        .method(virtual_method("_input").with_args(vec![PropertyInfo::object("event", "InputEvent")]))
        .signal(MethodInfo::new("ready"))
        .signal(MethodInfo::new("tree_entered"))
        .signal(MethodInfo::new("tree_exited"))
        .signal(MethodInfo::new("child_entered_tree").with_args(vec![PropertyInfo::object("node", "Node")]))
        .constant("NOTIFICATION_READY", 13)
        .constant("NOTIFICATION_PROCESS", 17)
        .enumeration(
            "ProcessMode",
            &[
                ("PROCESS_MODE_INHERIT", 0),
                ("PROCESS_MODE_PAUSABLE", 1),
                ("PROCESS_MODE_WHEN_PAUSED", 2),
                ("PROCESS_MODE_ALWAYS", 3),
                ("PROCESS_MODE_DISABLED", 4),
            ],
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_db::ClassDb;

    #[test]
    fn node_hierarchy() {
        let db = ClassRegistry::with_core_classes();
        assert!(db.is_parent_class("Sprite2D", "Node"));
        assert!(db.is_parent_class("Button", "Control"));
        assert!(!db.is_parent_class("Node", "Resource"));
        assert!(db.is_abstract("CanvasItem"));
        assert!(db.has_signal("Timer", "timeout"));
        assert!(db.has_method("Sprite2D", "queue_free", false));
    }

    #[test]
    fn variant_type_enum() {
        let db = ClassRegistry::with_core_classes();
        let values = db.global_enum("Variant.Type");
        assert_eq!(values.and_then(|v| v.get("TYPE_INT")).copied(), Some(2));
        assert_eq!(values.and_then(|v| v.get("TYPE_VECTOR2I")).copied(), Some(6));
        assert_eq!(values.and_then(|v| v.get("TYPE_PACKED_INT32_ARRAY")).copied(), Some(30));
        assert_eq!(values.and_then(|v| v.get("TYPE_STRING_NAME")).copied(), Some(21));
    }

    #[test]
    fn global_constants() {
        let db = ClassRegistry::with_core_classes();
        assert_eq!(db.global_constant("OK").map(|c| c.value), Some(0));
        assert_eq!(db.global_constant("TYPE_MAX").map(|c| c.value), Some(39));
        assert_eq!(db.singleton("Input"), Some("Input"));
    }
}
