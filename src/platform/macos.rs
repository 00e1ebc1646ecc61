//! AppKit overlay panel and main-thread event pump.
//!
//! The overlay is a borderless non-activating `NSPanel` subclass holding a
//! single `NSTextField`. Non-activating means the panel can become key and
//! take keystrokes while the previously active application stays active, so
//! ordering the panel out hands focus straight back to it.
//!
//! Every function here must run on the main thread.

use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use cocoa::appkit::NSApp;
use cocoa::base::{id, nil, NO, YES};
use cocoa::foundation::{NSPoint, NSRect, NSSize, NSString};
use objc::declare::ClassDecl;
use objc::runtime::{Class, Object, Sel, BOOL};
use objc::{class, msg_send, sel, sel_impl};

use crate::dispatch::UiSender;
use crate::error::StackError;
use crate::focus::{FieldHandle, FocusArbiter, FocusClaim, SurfaceHandle};
use crate::logging;
use crate::overlay::OverlayEvent;

const PANEL_CLASS: &str = "StackOverlayPanel";
const FIELD_DELEGATE_CLASS: &str = "StackOverlayFieldDelegate";
const SENDER_IVAR: &str = "uiSender";

const PANEL_WIDTH: f64 = 500.0;
const PANEL_HEIGHT: f64 = 80.0;

// NSWindowStyleMask
const NS_WINDOW_STYLE_MASK_BORDERLESS: u64 = 0;
const NS_WINDOW_STYLE_MASK_NONACTIVATING_PANEL: u64 = 1 << 7;

// NSBackingStoreBuffered
const NS_BACKING_STORE_BUFFERED: u64 = 2;

// NSFloatingWindowLevel
const NS_FLOATING_WINDOW_LEVEL: i64 = 3;

// NSWindowCollectionBehavior
const NS_WINDOW_COLLECTION_BEHAVIOR_CAN_JOIN_ALL_SPACES: u64 = 1 << 0;
const NS_WINDOW_COLLECTION_BEHAVIOR_IGNORES_CYCLE: u64 = 1 << 6;
const NS_WINDOW_COLLECTION_BEHAVIOR_FULL_SCREEN_AUXILIARY: u64 = 1 << 8;

// NSFocusRingTypeNone
const NS_FOCUS_RING_TYPE_NONE: u64 = 1;

// NSApplicationActivationPolicyAccessory
const NS_APPLICATION_ACTIVATION_POLICY_ACCESSORY: i64 = 1;

// NSEventMaskAny
const NS_EVENT_MASK_ANY: u64 = u64::MAX;

fn debug_assert_main_thread() {
    unsafe {
        let is_main: bool = msg_send![class!(NSThread), isMainThread];
        debug_assert!(is_main, "AppKit calls must run on the main thread");
    }
}

// ============================================================================
// Application
// ============================================================================

/// Create the shared NSApplication as an accessory app (no Dock icon, no
/// menu bar ownership) and finish launching it.
pub fn init_application() {
    debug_assert_main_thread();
    unsafe {
        let app: id = msg_send![class!(NSApplication), sharedApplication];
        let _: () = msg_send![app, setActivationPolicy: NS_APPLICATION_ACTIVATION_POLICY_ACCESSORY];
        let _: () = msg_send![app, finishLaunching];
    }
    logging::log(
        "PANEL",
        "Configured app as accessory (no Dock icon, no menu bar ownership)",
    );
}

/// Dispatch AppKit events for up to `timeout`.
///
/// Waits for the first event, then drains whatever else is already queued.
pub fn pump_events(timeout: Duration) {
    debug_assert_main_thread();
    objc::rc::autoreleasepool(|| unsafe {
        let app: id = NSApp();
        let mode = ns_string("kCFRunLoopDefaultMode");
        let mut until: id =
            msg_send![class!(NSDate), dateWithTimeIntervalSinceNow: timeout.as_secs_f64()];
        loop {
            let event: id = msg_send![
                app,
                nextEventMatchingMask: NS_EVENT_MASK_ANY
                untilDate: until
                inMode: mode
                dequeue: YES
            ];
            if event == nil {
                break;
            }
            let _: () = msg_send![app, sendEvent: event];
            until = msg_send![class!(NSDate), distantPast];
        }
        let _: () = msg_send![app, updateWindows];
    });
}

// ============================================================================
// Overlay panel
// ============================================================================

/// FocusArbiter backed by a real AppKit panel.
pub struct AppKitArbiter {
    panel: id,
    field: id,
    delegate: id,
    /// Owned by the delegate's ivar; freed in Drop
    sender: *mut UiSender,
}

impl AppKitArbiter {
    pub fn new(sender: UiSender) -> Result<Self, StackError> {
        debug_assert_main_thread();
        let sender = Box::into_raw(Box::new(sender));

        unsafe {
            let delegate: id = msg_send![field_delegate_class(), new];
            if delegate == nil {
                drop(Box::from_raw(sender));
                return Err(StackError::Platform(
                    "could not create overlay field delegate".to_string(),
                ));
            }
            (*delegate).set_ivar::<*mut c_void>(SENDER_IVAR, sender as *mut c_void);

            let panel = create_panel();
            if panel == nil {
                let _: () = msg_send![delegate, release];
                drop(Box::from_raw(sender));
                return Err(StackError::Platform(
                    "could not create overlay panel".to_string(),
                ));
            }

            let field = create_field(delegate);
            let content_view: id = msg_send![panel, contentView];
            let _: () = msg_send![content_view, addSubview: field];
            let _: () = msg_send![content_view, addSubview: create_hint_label()];

            logging::log(
                "PANEL",
                &format!(
                    "Overlay panel created (level={}, nonactivating)",
                    NS_FLOATING_WINDOW_LEVEL
                ),
            );

            Ok(Self {
                panel,
                field,
                delegate,
                sender,
            })
        }
    }

    unsafe fn position_on_main_screen(&self) {
        let screen: id = msg_send![class!(NSScreen), mainScreen];
        if screen == nil {
            return;
        }
        let frame: NSRect = msg_send![screen, frame];
        let origin = NSPoint::new(
            frame.origin.x + (frame.size.width - PANEL_WIDTH) / 2.0,
            frame.origin.y + frame.size.height * 0.75 - PANEL_HEIGHT / 2.0,
        );
        let _: () = msg_send![self.panel, setFrameOrigin: origin];
    }
}

impl FocusArbiter for AppKitArbiter {
    fn present_above_all(&mut self, _surface: SurfaceHandle) {
        debug_assert_main_thread();
        unsafe {
            let _: () = msg_send![self.field, setStringValue: ns_string("")];
            self.position_on_main_screen();
            let _: () = msg_send![self.panel, orderFrontRegardless];
        }
    }

    fn claim_keyboard_focus(&mut self, _surface: SurfaceHandle, _field: FieldHandle) -> FocusClaim {
        debug_assert_main_thread();
        unsafe {
            let _: () = msg_send![self.panel, makeKeyWindow];
            let responder: BOOL = msg_send![self.panel, makeFirstResponder: self.field];
            let is_key: BOOL = msg_send![self.panel, isKeyWindow];
            if responder == YES && is_key == YES {
                FocusClaim::Granted
            } else {
                FocusClaim::Denied
            }
        }
    }

    fn dismiss(&mut self, _surface: SurfaceHandle) {
        debug_assert_main_thread();
        unsafe {
            let _: () = msg_send![self.panel, orderOut: nil];
        }
    }
}

impl Drop for AppKitArbiter {
    fn drop(&mut self) {
        unsafe {
            let _: () = msg_send![self.field, setDelegate: nil];
            let _: () = msg_send![self.panel, orderOut: nil];
            let _: () = msg_send![self.panel, close];
            let _: () = msg_send![self.field, release];
            let _: () = msg_send![self.panel, release];
            (*self.delegate).set_ivar::<*mut c_void>(SENDER_IVAR, std::ptr::null_mut());
            let _: () = msg_send![self.delegate, release];
            drop(Box::from_raw(self.sender));
        }
    }
}

unsafe fn create_panel() -> id {
    let rect = NSRect::new(NSPoint::new(0.0, 0.0), NSSize::new(PANEL_WIDTH, PANEL_HEIGHT));
    let style = NS_WINDOW_STYLE_MASK_BORDERLESS | NS_WINDOW_STYLE_MASK_NONACTIVATING_PANEL;

    let panel: id = msg_send![panel_class(), alloc];
    let panel: id = msg_send![
        panel,
        initWithContentRect: rect
        styleMask: style
        backing: NS_BACKING_STORE_BUFFERED
        defer: NO
    ];
    if panel == nil {
        return nil;
    }

    let _: () = msg_send![panel, setLevel: NS_FLOATING_WINDOW_LEVEL];
    let behavior = NS_WINDOW_COLLECTION_BEHAVIOR_CAN_JOIN_ALL_SPACES
        | NS_WINDOW_COLLECTION_BEHAVIOR_IGNORES_CYCLE
        | NS_WINDOW_COLLECTION_BEHAVIOR_FULL_SCREEN_AUXILIARY;
    let _: () = msg_send![panel, setCollectionBehavior: behavior];
    let _: () = msg_send![panel, setHidesOnDeactivate: NO];
    let _: () = msg_send![panel, setFloatingPanel: YES];
    let _: () = msg_send![panel, setBecomesKeyOnlyIfNeeded: NO];
    let _: () = msg_send![panel, setReleasedWhenClosed: NO];
    let _: () = msg_send![panel, setRestorable: NO];
    let _: () = msg_send![panel, setMovable: NO];
    let _: () = msg_send![panel, setHasShadow: YES];
    let _: () = msg_send![panel, setOpaque: NO];

    let background: id = msg_send![class!(NSColor), colorWithCalibratedWhite: 0.0f64 alpha: 0.96f64];
    let _: () = msg_send![panel, setBackgroundColor: background];
    panel
}

unsafe fn create_field(delegate: id) -> id {
    let rect = NSRect::new(NSPoint::new(20.0, 30.0), NSSize::new(460.0, 34.0));
    let field: id = msg_send![class!(NSTextField), alloc];
    let field: id = msg_send![field, initWithFrame: rect];

    let _: () = msg_send![field, setBordered: NO];
    let _: () = msg_send![field, setBezeled: NO];
    let _: () = msg_send![field, setDrawsBackground: NO];
    let _: () = msg_send![field, setFocusRingType: NS_FOCUS_RING_TYPE_NONE];
    let white: id = msg_send![class!(NSColor), whiteColor];
    let _: () = msg_send![field, setTextColor: white];
    let font: id = msg_send![class!(NSFont), systemFontOfSize: 15.0f64];
    let _: () = msg_send![field, setFont: font];
    let _: () = msg_send![field, setPlaceholderString: ns_string("what's the idea?")];

    let cell: id = msg_send![field, cell];
    let _: () = msg_send![cell, setUsesSingleLineMode: YES];
    let _: () = msg_send![cell, setWraps: NO];
    let _: () = msg_send![cell, setScrollable: YES];

    let _: () = msg_send![field, setDelegate: delegate];
    field
}

unsafe fn create_hint_label() -> id {
    let label: id = msg_send![
        class!(NSTextField),
        labelWithString: ns_string("enter to save \u{2022} esc to cancel")
    ];
    let rect = NSRect::new(NSPoint::new(20.0, 8.0), NSSize::new(460.0, 14.0));
    let _: () = msg_send![label, setFrame: rect];
    let gray: id = msg_send![class!(NSColor), colorWithCalibratedWhite: 1.0f64 alpha: 0.3f64];
    let _: () = msg_send![label, setTextColor: gray];
    let font: id = msg_send![class!(NSFont), systemFontOfSize: 10.0f64];
    let _: () = msg_send![label, setFont: font];
    // NSTextAlignmentCenter
    let _: () = msg_send![label, setAlignment: 1u64];
    label
}

// ============================================================================
// Objective-C classes
// ============================================================================

fn panel_class() -> &'static Class {
    if let Some(class) = Class::get(PANEL_CLASS) {
        return class;
    }

    extern "C" fn can_become_key(_this: &Object, _sel: Sel) -> BOOL {
        YES
    }

    extern "C" fn can_become_main(_this: &Object, _sel: Sel) -> BOOL {
        NO
    }

    let mut decl = match ClassDecl::new(PANEL_CLASS, class!(NSPanel)) {
        Some(decl) => decl,
        // Lost a registration race; the class exists now
        None => return Class::get(PANEL_CLASS).unwrap_or(class!(NSPanel)),
    };
    unsafe {
        decl.add_method(
            sel!(canBecomeKeyWindow),
            can_become_key as extern "C" fn(&Object, Sel) -> BOOL,
        );
        decl.add_method(
            sel!(canBecomeMainWindow),
            can_become_main as extern "C" fn(&Object, Sel) -> BOOL,
        );
    }
    decl.register()
}

fn field_delegate_class() -> &'static Class {
    if let Some(class) = Class::get(FIELD_DELEGATE_CLASS) {
        return class;
    }

    // Both callbacks come from AppKit on the main thread. Panics must not
    // unwind across the FFI boundary.
    extern "C" fn text_did_change(this: &Object, _sel: Sel, notification: id) {
        let _ = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
            let field: id = msg_send![notification, object];
            post(this, OverlayEvent::TextChanged(field_text(field)));
        }));
    }

    extern "C" fn do_command(
        this: &Object,
        _sel: Sel,
        control: id,
        _text_view: id,
        command: Sel,
    ) -> BOOL {
        panic::catch_unwind(AssertUnwindSafe(|| unsafe {
            if command == sel!(cancelOperation:) {
                post(this, OverlayEvent::Escape);
                YES
            } else if command == sel!(insertNewline:) {
                post(this, OverlayEvent::TextChanged(field_text(control)));
                post(this, OverlayEvent::Submit);
                YES
            } else {
                NO
            }
        }))
        .unwrap_or(NO)
    }

    let mut decl = match ClassDecl::new(FIELD_DELEGATE_CLASS, class!(NSObject)) {
        Some(decl) => decl,
        None => return Class::get(FIELD_DELEGATE_CLASS).unwrap_or(class!(NSObject)),
    };
    decl.add_ivar::<*mut c_void>(SENDER_IVAR);
    unsafe {
        decl.add_method(
            sel!(controlTextDidChange:),
            text_did_change as extern "C" fn(&Object, Sel, id),
        );
        decl.add_method(
            sel!(control:textView:doCommandBySelector:),
            do_command as extern "C" fn(&Object, Sel, id, id, Sel) -> BOOL,
        );
    }
    decl.register()
}

/// Post to the UI queue through the sender stored on the delegate.
unsafe fn post(delegate: &Object, event: OverlayEvent) {
    let sender = *delegate.get_ivar::<*mut c_void>(SENDER_IVAR) as *const UiSender;
    if let Some(sender) = sender.as_ref() {
        sender.post_overlay(event);
    }
}

unsafe fn field_text(field: id) -> String {
    if field == nil {
        return String::new();
    }
    let value: id = msg_send![field, stringValue];
    if value == nil {
        return String::new();
    }
    let utf8: *const c_char = msg_send![value, UTF8String];
    if utf8.is_null() {
        return String::new();
    }
    CStr::from_ptr(utf8).to_string_lossy().into_owned()
}

unsafe fn ns_string(s: &str) -> id {
    let string = NSString::alloc(nil).init_str(s);
    msg_send![string, autorelease]
}
