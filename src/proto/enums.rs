//! Static name tables for core protocol enums, bitmasks and sentinels.
//!
//! Enum tables are indexed by wire value; an empty string marks a hole in a
//! sparse table. Mask tables are indexed by bit position. Sentinel tables
//! pair exact values with the name the protocol gives them in a specific
//! field.

// --- enums -----------------------------------------------------------------

pub const WINDOW_CLASS: &[&str] = &["CopyFromParent", "InputOutput", "InputOnly"];

pub const BIT_GRAVITY: &[&str] = &[
    "Forget",
    "NorthWest",
    "North",
    "NorthEast",
    "West",
    "Center",
    "East",
    "SouthWest",
    "South",
    "SouthEast",
    "Static",
];

pub const WIN_GRAVITY: &[&str] = &[
    "Unmap",
    "NorthWest",
    "North",
    "NorthEast",
    "West",
    "Center",
    "East",
    "SouthWest",
    "South",
    "SouthEast",
    "Static",
];

pub const BACKING_STORE: &[&str] = &["NotUseful", "WhenMapped", "Always"];
pub const SCREEN_BACKING_STORES: &[&str] = &["Never", "WhenMapped", "Always"];
pub const MAP_STATE: &[&str] = &["Unmapped", "Unviewable", "Viewable"];

pub const SAVE_SET_MODE: &[&str] = &["Insert", "Delete"];
pub const CIRCULATE_DIRECTION: &[&str] = &["RaiseLowest", "LowerHighest"];
pub const CIRCULATE_PLACE: &[&str] = &["Top", "Bottom"];

pub const PROPERTY_MODE: &[&str] = &["Replace", "Prepend", "Append"];
pub const PROPERTY_STATE: &[&str] = &["NewValue", "Deleted"];

pub const STACK_MODE: &[&str] = &["Above", "Below", "TopIf", "BottomIf", "Opposite"];

pub const GRAB_MODE: &[&str] = &["Synchronous", "Asynchronous"];
pub const GRAB_STATUS: &[&str] = &[
    "Success",
    "AlreadyGrabbed",
    "InvalidTime",
    "NotViewable",
    "Frozen",
];

pub const ALLOW_EVENTS_MODE: &[&str] = &[
    "AsyncPointer",
    "SyncPointer",
    "ReplayPointer",
    "AsyncKeyboard",
    "SyncKeyboard",
    "ReplayKeyboard",
    "AsyncBoth",
    "SyncBoth",
];

pub const REVERT_TO: &[&str] = &["None", "PointerRoot", "Parent"];

pub const FOCUS_DETAIL: &[&str] = &[
    "Ancestor",
    "Virtual",
    "Inferior",
    "Nonlinear",
    "NonlinearVirtual",
    "Pointer",
    "PointerRoot",
    "None",
];
pub const CROSSING_DETAIL: &[&str] = &[
    "Ancestor",
    "Virtual",
    "Inferior",
    "Nonlinear",
    "NonlinearVirtual",
];
pub const CROSSING_MODE: &[&str] = &["Normal", "Grab", "Ungrab"];
pub const FOCUS_MODE: &[&str] = &["Normal", "Grab", "Ungrab", "WhileGrabbed"];
pub const MOTION_DETAIL: &[&str] = &["Normal", "Hint"];

pub const VISIBILITY_STATE: &[&str] = &[
    "Unobscured",
    "PartiallyObscured",
    "FullyObscured",
];
pub const COLORMAP_STATE: &[&str] = &["Uninstalled", "Installed"];
pub const COLORMAP_ALLOC: &[&str] = &["None", "All"];
pub const MAPPING_REQUEST: &[&str] = &["Modifier", "Keyboard", "Pointer"];

pub const GC_FUNCTION: &[&str] = &[
    "Clear",
    "And",
    "AndReverse",
    "Copy",
    "AndInverted",
    "NoOp",
    "Xor",
    "Or",
    "Nor",
    "Equiv",
    "Invert",
    "OrReverse",
    "CopyInverted",
    "OrInverted",
    "Nand",
    "Set",
];
pub const LINE_STYLE: &[&str] = &["Solid", "OnOffDash", "DoubleDash"];
pub const CAP_STYLE: &[&str] = &["NotLast", "Butt", "Round", "Projecting"];
pub const JOIN_STYLE: &[&str] = &["Miter", "Round", "Bevel"];
pub const FILL_STYLE: &[&str] = &["Solid", "Tiled", "Stippled", "OpaqueStippled"];
pub const FILL_RULE: &[&str] = &["EvenOdd", "Winding"];
pub const SUBWINDOW_MODE: &[&str] = &["ClipByChildren", "IncludeInferiors"];
pub const ARC_MODE: &[&str] = &["Chord", "PieSlice"];

pub const POLY_SHAPE: &[&str] = &["Complex", "Nonconvex", "Convex"];
pub const COORDINATE_MODE: &[&str] = &["Origin", "Previous"];
pub const CLIP_ORDERING: &[&str] = &["UnSorted", "YSorted", "YXSorted", "YXBanded"];
pub const IMAGE_FORMAT: &[&str] = &["Bitmap", "XYPixmap", "ZPixmap"];

pub const LED_MODE: &[&str] = &["Off", "On"];
pub const AUTO_REPEAT_MODE: &[&str] = &["Off", "On", "Default"];
pub const YES_NO_DEFAULT: &[&str] = &["No", "Yes", "Default"];

pub const HOST_FAMILY: &[&str] = &[
    "Internet",
    "DECnet",
    "Chaos",
    "",
    "",
    "ServerInterpreted",
    "InternetV6",
];
pub const HOST_CHANGE_MODE: &[&str] = &["Insert", "Delete"];
pub const ACCESS_MODE: &[&str] = &["Disable", "Enable"];
pub const ACCESS_LIST_MODE: &[&str] = &["Disabled", "Enabled"];
pub const CLOSE_DOWN_MODE: &[&str] = &["Destroy", "RetainPermanent", "RetainTemporary"];
pub const FORCE_SCREEN_SAVER_MODE: &[&str] = &["Reset", "Activate"];
pub const MAPPING_STATUS: &[&str] = &["Success", "Busy", "Failed"];
pub const QUERY_BEST_CLASS: &[&str] = &["Cursor", "Tile", "Stipple"];
pub const DRAW_DIRECTION: &[&str] = &["LeftToRight", "RightToLeft"];

pub const VISUAL_CLASS: &[&str] = &[
    "StaticGray",
    "GrayScale",
    "StaticColor",
    "PseudoColor",
    "TrueColor",
    "DirectColor",
];
pub const IMAGE_BYTE_ORDER: &[&str] = &["LSBFirst", "MSBFirst"];
pub const BITMAP_BIT_ORDER: &[&str] = &["LeastSignificant", "MostSignificant"];
pub const GLOBAL_AUTO_REPEAT: &[&str] = &["Off", "On"];

// --- bitmasks (indexed by bit position) ------------------------------------

pub const EVENT_MASK: &[&str] = &[
    "KeyPress",
    "KeyRelease",
    "ButtonPress",
    "ButtonRelease",
    "EnterWindow",
    "LeaveWindow",
    "PointerMotion",
    "PointerMotionHint",
    "Button1Motion",
    "Button2Motion",
    "Button3Motion",
    "Button4Motion",
    "Button5Motion",
    "ButtonMotion",
    "KeymapState",
    "Exposure",
    "VisibilityChange",
    "StructureNotify",
    "ResizeRedirect",
    "SubstructureNotify",
    "SubstructureRedirect",
    "FocusChange",
    "PropertyChange",
    "ColormapChange",
    "OwnerGrabButton",
];

pub const POINTER_EVENT_MASK: &[&str] = &[
    "",
    "",
    "ButtonPress",
    "ButtonRelease",
    "EnterWindow",
    "LeaveWindow",
    "PointerMotion",
    "PointerMotionHint",
    "Button1Motion",
    "Button2Motion",
    "Button3Motion",
    "Button4Motion",
    "Button5Motion",
    "ButtonMotion",
    "KeymapState",
];

pub const KEYBUTMASK: &[&str] = &[
    "Shift",
    "Lock",
    "Control",
    "Mod1",
    "Mod2",
    "Mod3",
    "Mod4",
    "Mod5",
    "Button1",
    "Button2",
    "Button3",
    "Button4",
    "Button5",
];

pub const KEYMASK: &[&str] = &[
    "Shift", "Lock", "Control", "Mod1", "Mod2", "Mod3", "Mod4", "Mod5",
];

pub const DO_RGB_MASK: &[&str] = &["DoRed", "DoGreen", "DoBlue"];

pub const CONFIGURE_WINDOW_MASK: &[&str] = &[
    "x",
    "y",
    "width",
    "height",
    "border-width",
    "sibling",
    "stack-mode",
];

// --- sentinels --------------------------------------------------------------

pub const NONE: &[(u32, &str)] = &[(0, "None")];
pub const NONE_PARENT_RELATIVE: &[(u32, &str)] = &[(0, "None"), (1, "ParentRelative")];
pub const COPY_FROM_PARENT: &[(u32, &str)] = &[(0, "CopyFromParent")];
pub const POINTER_WINDOW_INPUT_FOCUS: &[(u32, &str)] =
    &[(0, "PointerWindow"), (1, "InputFocus")];
pub const NONE_POINTER_ROOT: &[(u32, &str)] = &[(0, "None"), (1, "PointerRoot")];
pub const ANY_PROPERTY_TYPE: &[(u32, &str)] = &[(0, "AnyPropertyType")];
pub const ANY_BUTTON: &[(u32, &str)] = &[(0, "AnyButton")];
pub const ANY_KEY: &[(u32, &str)] = &[(0, "AnyKey")];
pub const ALL_TEMPORARY: &[(u32, &str)] = &[(0, "AllTemporary")];

/// SETofKEYMASK value meaning "any modifier combination".
pub const ANY_MODIFIER: u32 = 0x8000;
