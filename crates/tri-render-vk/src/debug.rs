// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_void, CStr};

use ash::vk;
use tri_render::{DiagnosticMessage, DiagnosticsSink, MessageCategory, Severity};

/// Create-info wired to `sink`. The sink must stay at the same address for
/// as long as the driver can call back with it.
pub(crate) fn messenger_create_info(
  sink: &DiagnosticsSink,
) -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
  vk::DebugUtilsMessengerCreateInfoEXT::default()
    .message_severity(
      vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
        | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
    )
    .message_type(
      vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
    )
    .pfn_user_callback(Some(debug_callback))
    .user_data(sink as *const DiagnosticsSink as *mut c_void)
}

fn severity_of(flags: vk::DebugUtilsMessageSeverityFlagsEXT) -> Severity {
  if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
    Severity::Error
  } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
    Severity::Warning
  } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
    Severity::Info
  } else {
    Severity::Verbose
  }
}

// Runs on a driver thread. Only converts and queues; never blocks.
unsafe extern "system" fn debug_callback(
  message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
  message_types: vk::DebugUtilsMessageTypeFlagsEXT,
  p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
  p_user_data: *mut c_void,
) -> vk::Bool32 {
  if p_user_data.is_null() || p_callback_data.is_null() {
    return vk::FALSE;
  }
  // SAFETY: p_user_data is the boxed sink registered with this messenger;
  // its owner destroys the messenger before dropping the box.
  let sink = unsafe { &*(p_user_data as *const DiagnosticsSink) };
  // SAFETY: the driver hands us a valid callback-data struct for the call.
  let p_message = unsafe { (*p_callback_data).p_message };
  let text = if p_message.is_null() {
    String::new()
  } else {
    // SAFETY: non-null p_message is NUL-terminated for the duration of the callback.
    unsafe { CStr::from_ptr(p_message) }.to_string_lossy().into_owned()
  };

  sink.push(DiagnosticMessage {
    severity: severity_of(message_severity),
    category: MessageCategory::from_bits_truncate(message_types.as_raw()),
    text,
  });

  vk::FALSE
}
